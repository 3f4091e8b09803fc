use crate::compositing::{apply_matte, crop_to_content, decode_image, encode_png, matte_to_alpha};
use crate::error::MattingError;
use crate::workflow::{MatteService, RequestCategory};
use std::time::Instant;
use uuid::Uuid;

/// Where the pipeline's source image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Remote image referenced by URL; fetched for local compositing.
    Url(String),
    /// In-memory image submitted inline as a `data:` URL.
    Bytes {
        name: String,
        mime: String,
        data: Vec<u8>,
    },
}

impl ImageSource {
    /// The reference submitted to the workflow service.
    fn submit_reference(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Bytes { mime, data, .. } => crate::workflow::encode_data_url(mime, data),
        }
    }

    /// Short reference recorded on the result.
    fn display_reference(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Lifecycle of the engine's current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Idle,
    Processing,
    Completed,
    Failed,
}

/// Outcome of one successful pipeline run. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct MattingResult {
    pub id: String,
    pub original_image: String,
    pub matte_image: Option<String>,
    pub result_png: Vec<u8>,
    pub matte_png: Option<Vec<u8>>,
    pub category: RequestCategory,
    pub confidence: f32,
    pub processing_time_ms: u64,
}

/// Sequences one matting run: workflow request → artifact fetch →
/// matte-to-alpha → destination-in composite → content crop → encode.
///
/// Holds run status, progress and the accumulated result list. Errors
/// from any stage surface as a single failed run; prior results are
/// left untouched. Retries, if wanted, belong to the caller.
pub struct MattingEngine {
    service: Box<dyn MatteService>,
    crop: bool,
    keep_matte: bool,
    status: ProcessingStatus,
    progress: u8,
    error: Option<String>,
    results: Vec<MattingResult>,
}

impl MattingEngine {
    pub fn new(service: Box<dyn MatteService>) -> Self {
        Self {
            service,
            crop: true,
            keep_matte: false,
            status: ProcessingStatus::Idle,
            progress: 0,
            error: None,
            results: Vec::new(),
        }
    }

    /// Disable or enable cropping the result to its content bounds.
    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    /// Keep the raw matte bytes on the result.
    pub fn with_matte_kept(mut self, keep: bool) -> Self {
        self.keep_matte = keep;
        self
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn results(&self) -> &[MattingResult] {
        &self.results
    }

    /// Run the full pipeline for one image.
    ///
    /// On success the result is prepended to the result list and
    /// returned; on failure the engine reports `Failed` with the error
    /// detail and the result list is unchanged.
    pub async fn process_image(
        &mut self,
        source: ImageSource,
        category: RequestCategory,
    ) -> Result<&MattingResult, MattingError> {
        self.status = ProcessingStatus::Processing;
        self.progress = 0;
        self.error = None;

        match self.run(source, category).await {
            Ok(result) => {
                self.progress = 100;
                self.status = ProcessingStatus::Completed;
                self.results.insert(0, result);
                Ok(&self.results[0])
            }
            Err(err) => {
                self.status = ProcessingStatus::Failed;
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        source: ImageSource,
        category: RequestCategory,
    ) -> Result<MattingResult, MattingError> {
        let started = Instant::now();

        let submit_reference = source.submit_reference();
        self.progress = 20;

        let request_start = Instant::now();
        let response = self.service.request_matte(&submit_reference, category).await?;
        tracing::debug!(
            "Workflow answered in {:.1}ms, matte at {}",
            request_start.elapsed().as_secs_f64() * 1000.0,
            response.matte_uri
        );
        self.progress = 60;

        // The original and the matte are independent until compositing,
        // so their downloads may overlap. Both must complete before the
        // composite starts.
        let fetch_start = Instant::now();
        let service = self.service.as_ref();
        let original_fetch = async {
            match &source {
                ImageSource::Url(url) => service.fetch_image(url).await,
                ImageSource::Bytes { data, .. } => Ok(data.clone()),
            }
        };
        let (original_bytes, matte_bytes) =
            tokio::try_join!(original_fetch, service.fetch_image(&response.matte_uri))?;
        tracing::debug!(
            "Artifacts fetched in {:.1}ms",
            fetch_start.elapsed().as_secs_f64() * 1000.0
        );
        self.progress = 80;

        let composite_start = Instant::now();
        let original = decode_image(&original_bytes)?;
        let matte = decode_image(&matte_bytes)?;
        let alpha = matte_to_alpha(&matte);
        let composited = apply_matte(&original, &alpha)?;
        let framed = if self.crop {
            crop_to_content(&composited).ok_or(MattingError::EmptyContent)?
        } else {
            composited
        };
        let result_png = encode_png(&framed)?;
        tracing::debug!(
            "Composited in {:.1}ms",
            composite_start.elapsed().as_secs_f64() * 1000.0
        );

        let processing_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Matting finished: {}x{} -> {}x{}, confidence={:.2}, total={}ms",
            original.width(),
            original.height(),
            framed.width(),
            framed.height(),
            response.confidence,
            processing_time_ms
        );

        Ok(MattingResult {
            id: Uuid::new_v4().to_string(),
            original_image: source.display_reference(),
            matte_image: Some(response.matte_uri),
            result_png,
            matte_png: self.keep_matte.then_some(matte_bytes),
            category,
            confidence: response.confidence,
            processing_time_ms,
        })
    }

    /// Remove one result by id. Returns whether anything was removed.
    pub fn remove_result(&mut self, id: &str) -> bool {
        let before = self.results.len();
        self.results.retain(|result| result.id != id);
        self.results.len() != before
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Return the engine to idle without touching the result list.
    pub fn reset(&mut self) {
        self.status = ProcessingStatus::Idle;
        self.progress = 0;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::MatteResponse;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::sync::{Arc, Mutex};

    const MATTE_URI: &str = "mock://matte";

    /// Serves a fixed matte and original, recording submissions.
    struct MockService {
        matte_png: Vec<u8>,
        original_png: Vec<u8>,
        submissions: Arc<Mutex<Vec<(String, RequestCategory)>>>,
    }

    impl MockService {
        fn new(matte: &RgbaImage, original: &RgbaImage) -> Self {
            Self {
                matte_png: encode_png(matte).unwrap(),
                original_png: encode_png(original).unwrap(),
                submissions: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl MatteService for MockService {
        async fn request_matte(
            &self,
            image: &str,
            category: RequestCategory,
        ) -> Result<MatteResponse, MattingError> {
            self.submissions
                .lock()
                .unwrap()
                .push((image.to_string(), category));
            Ok(MatteResponse {
                matte_uri: MATTE_URI.to_string(),
                confidence: 0.9,
            })
        }

        async fn fetch_image(&self, uri: &str) -> Result<Vec<u8>, MattingError> {
            match uri {
                MATTE_URI => Ok(self.matte_png.clone()),
                "mock://original" => Ok(self.original_png.clone()),
                other => Err(MattingError::StreamRead(format!("unknown uri {other}"))),
            }
        }
    }

    struct RejectingService;

    #[async_trait]
    impl MatteService for RejectingService {
        async fn request_matte(
            &self,
            _image: &str,
            _category: RequestCategory,
        ) -> Result<MatteResponse, MattingError> {
            Err(MattingError::Http {
                status: 503,
                body: "overloaded".to_string(),
            })
        }

        async fn fetch_image(&self, _uri: &str) -> Result<Vec<u8>, MattingError> {
            unreachable!("request is rejected first")
        }
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    /// Grayscale matte: left half white (foreground), right half black.
    fn half_matte(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            let value = if x < width / 2 { 255 } else { 0 };
            Rgba([value, value, value, 255])
        })
    }

    #[tokio::test]
    async fn half_matte_composites_and_crops_to_left_half() {
        let original = solid(8, 4, [50, 90, 140, 255]);
        let service = MockService::new(&half_matte(8, 4), &original);
        let mut engine = MattingEngine::new(Box::new(service));

        let result = engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Product,
            )
            .await
            .unwrap();

        let cropped = decode_image(&result.result_png).unwrap();
        assert_eq!(cropped.dimensions(), (4, 4));
        for pixel in cropped.pixels() {
            assert_eq!(pixel.0, [50, 90, 140, 255]);
        }
        assert_eq!(engine.status(), ProcessingStatus::Completed);
        assert_eq!(engine.progress(), 100);
    }

    #[tokio::test]
    async fn uncropped_run_keeps_canvas_and_clears_right_half() {
        let original = solid(8, 4, [50, 90, 140, 255]);
        let service = MockService::new(&half_matte(8, 4), &original);
        let mut engine = MattingEngine::new(Box::new(service)).with_crop(false);

        let result = engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Portrait,
            )
            .await
            .unwrap();

        let fused = decode_image(&result.result_png).unwrap();
        assert_eq!(fused.dimensions(), (8, 4));
        for (x, _, pixel) in fused.enumerate_pixels() {
            if x < 4 {
                assert_eq!(pixel.0, [50, 90, 140, 255]);
            } else {
                assert_eq!(pixel[3], 0);
            }
        }
    }

    #[tokio::test]
    async fn local_bytes_are_submitted_as_data_url() {
        let original = solid(4, 4, [10, 20, 30, 255]);
        let original_png = encode_png(&original).unwrap();
        let service = MockService::new(&half_matte(4, 4), &original);
        let submissions = Arc::clone(&service.submissions);
        let mut engine = MattingEngine::new(Box::new(service));

        let result = engine
            .process_image(
                ImageSource::Bytes {
                    name: "photo.png".to_string(),
                    mime: "image/png".to_string(),
                    data: original_png,
                },
                RequestCategory::Auto,
            )
            .await
            .unwrap();
        assert_eq!(result.original_image, "photo.png");
        assert_eq!(result.category, RequestCategory::Auto);
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(result.matte_image.as_deref(), Some(MATTE_URI));

        let submissions = submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (submitted, category) = &submissions[0];
        assert!(submitted.starts_with("data:image/png;base64,"));
        assert_eq!(*category, RequestCategory::Auto);
    }

    #[tokio::test]
    async fn all_background_matte_fails_with_empty_content() {
        let original = solid(4, 4, [10, 20, 30, 255]);
        let black = solid(4, 4, [0, 0, 0, 255]);
        let service = MockService::new(&black, &original);
        let mut engine = MattingEngine::new(Box::new(service));

        let err = engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Product,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MattingError::EmptyContent));
        assert_eq!(engine.status(), ProcessingStatus::Failed);
        assert!(engine.last_error().is_some());
    }

    #[tokio::test]
    async fn failed_run_leaves_prior_results_untouched() {
        let original = solid(4, 4, [1, 2, 3, 255]);
        let service = MockService::new(&half_matte(4, 4), &original);
        let mut engine = MattingEngine::new(Box::new(service));
        engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Product,
            )
            .await
            .unwrap();
        assert_eq!(engine.results().len(), 1);
        let first_id = engine.results()[0].id.clone();

        let mut engine = MattingEngine {
            service: Box::new(RejectingService),
            ..engine
        };
        let err = engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Product,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MattingError::Http { status: 503, .. }));
        assert_eq!(engine.status(), ProcessingStatus::Failed);
        assert_eq!(engine.results().len(), 1);
        assert_eq!(engine.results()[0].id, first_id);
    }

    #[tokio::test]
    async fn result_list_management() {
        let original = solid(4, 4, [1, 2, 3, 255]);
        let service = MockService::new(&half_matte(4, 4), &original);
        let mut engine = MattingEngine::new(Box::new(service));

        for _ in 0..3 {
            engine
                .process_image(
                    ImageSource::Url("mock://original".to_string()),
                    RequestCategory::Product,
                )
                .await
                .unwrap();
        }
        assert_eq!(engine.results().len(), 3);

        let middle = engine.results()[1].id.clone();
        assert!(engine.remove_result(&middle));
        assert!(!engine.remove_result(&middle));
        assert_eq!(engine.results().len(), 2);

        engine.clear_results();
        assert!(engine.results().is_empty());

        engine.reset();
        assert_eq!(engine.status(), ProcessingStatus::Idle);
        assert_eq!(engine.progress(), 0);
    }

    #[tokio::test]
    async fn matte_bytes_kept_on_request() {
        let original = solid(4, 4, [1, 2, 3, 255]);
        let matte = half_matte(4, 4);
        let matte_png = encode_png(&matte).unwrap();
        let service = MockService::new(&matte, &original);
        let mut engine = MattingEngine::new(Box::new(service)).with_matte_kept(true);

        let result = engine
            .process_image(
                ImageSource::Url("mock://original".to_string()),
                RequestCategory::Product,
            )
            .await
            .unwrap();
        assert_eq!(result.matte_png.as_deref(), Some(matte_png.as_slice()));
    }
}
