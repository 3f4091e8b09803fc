use super::config::{RequestCategory, ServiceRoutes};
use super::event::{self, EventData};
use super::stream::LineDecoder;
use crate::error::MattingError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{Stream, StreamExt};
use std::fmt;
use uuid::Uuid;

/// Outcome of one workflow run: where to fetch the matte from.
#[derive(Debug, Clone, PartialEq)]
pub struct MatteResponse {
    pub matte_uri: String,
    pub confidence: f32,
}

/// Seam between the pipeline and the remote matting backend.
///
/// Lets the orchestrator run against a mock service in tests and keeps
/// the door open for other workflow providers.
#[async_trait]
pub trait MatteService: Send + Sync {
    /// Submit an image reference and obtain the matte artifact reference.
    async fn request_matte(
        &self,
        image: &str,
        category: RequestCategory,
    ) -> Result<MatteResponse, MattingError>;

    /// Download an artifact's bytes.
    async fn fetch_image(&self, uri: &str) -> Result<Vec<u8>, MattingError>;
}

/// Streaming client for the remote matting workflow service.
///
/// Issues `POST {endpoint}/workflows/run` and consumes the chunked,
/// newline-delimited event stream it answers with. The stream is drained
/// to completion so the connection is fully consumed; the first
/// workflow-finished payload observed wins.
pub struct WorkflowClient {
    http: reqwest::Client,
    routes: ServiceRoutes,
    session: String,
}

impl WorkflowClient {
    pub fn new(routes: ServiceRoutes) -> Self {
        Self {
            http: reqwest::Client::new(),
            routes,
            session: Uuid::new_v4().to_string(),
        }
    }

    /// Run the matting workflow for one image reference.
    ///
    /// # Errors
    ///
    /// `UnsupportedCategory` if no config resolves for `category`;
    /// `Http` on a non-2xx response; `StreamRead` on transport failure
    /// (including failure to send the request); `NoTerminalEvent`,
    /// `ContentParse` and `NoImageResource` per the stream contract.
    pub async fn run_workflow(
        &self,
        image: &str,
        category: RequestCategory,
    ) -> Result<MatteResponse, MattingError> {
        let config = self.routes.resolve(category)?;
        tracing::debug!("Submitting workflow request for category {}", category);

        let response = self
            .http
            .post(format!(
                "{}/workflows/run",
                config.endpoint.trim_end_matches('/')
            ))
            .bearer_auth(&config.credential)
            .json(&serde_json::json!({
                "inputs": { "image": image },
                "response_mode": "streaming",
                "user": self.session,
            }))
            .send()
            .await
            .map_err(|e| MattingError::StreamRead(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MattingError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload = drain_events(response.bytes_stream()).await?;
        extract_matte(payload)
    }

    /// Fetch an artifact's bytes from an http(s) URL or an inline
    /// `data:` URL.
    pub async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, MattingError> {
        if uri.starts_with("data:") {
            return decode_data_url(uri);
        }

        let response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| MattingError::StreamRead(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MattingError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MattingError::StreamRead(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MatteService for WorkflowClient {
    async fn request_matte(
        &self,
        image: &str,
        category: RequestCategory,
    ) -> Result<MatteResponse, MattingError> {
        self.run_workflow(image, category).await
    }

    async fn fetch_image(&self, uri: &str) -> Result<Vec<u8>, MattingError> {
        self.fetch_bytes(uri).await
    }
}

/// Encode raw image bytes as an inline `data:` URL for submission.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

fn decode_data_url(uri: &str) -> Result<Vec<u8>, MattingError> {
    let body = &uri["data:".len()..];
    let (metadata, payload) = body
        .split_once(',')
        .ok_or_else(|| MattingError::Decode("data url has no payload".into()))?;
    if !metadata.ends_with(";base64") {
        return Err(MattingError::Decode(
            "data url is not base64-encoded".into(),
        ));
    }
    BASE64
        .decode(payload)
        .map_err(|e| MattingError::Decode(format!("data url payload: {e}")))
}

/// Consume the whole response stream and return the first terminal
/// payload observed.
///
/// Lines are reassembled across chunk boundaries; non-data and
/// unparseable lines are heartbeats and are skipped. After the first
/// terminal event the remaining records are read and discarded, so the
/// stream always ends cleanly consumed. A transport error aborts the
/// read; a stream that ends with no terminal event is a failure.
pub(crate) async fn drain_events<S, B, E>(mut stream: S) -> Result<EventData, MattingError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut decoder = LineDecoder::new();
    let mut terminal: Option<EventData> = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MattingError::StreamRead(e.to_string()))?;
        for line in decoder.feed(chunk.as_ref()) {
            observe_line(&line, &mut terminal);
        }
    }
    if let Some(line) = decoder.finish() {
        observe_line(&line, &mut terminal);
    }

    terminal.ok_or(MattingError::NoTerminalEvent)
}

fn observe_line(line: &str, terminal: &mut Option<EventData>) {
    if terminal.is_some() {
        return;
    }
    if let Some(event) = event::parse_event_line(line) {
        *terminal = event.into_terminal_payload();
    }
}

/// Second-stage decode: nested resource list → matte reference.
fn extract_matte(payload: EventData) -> Result<MatteResponse, MattingError> {
    let status = payload.status.as_deref().unwrap_or("unknown");
    if status != "succeeded" {
        tracing::warn!("Workflow finished with status {status}");
    }

    let outputs = payload.outputs.ok_or_else(|| {
        MattingError::ContentParse(format!("terminal payload has no outputs (status: {status})"))
    })?;
    let resources = event::decode_resources(&outputs.content)?;
    let descriptor = event::select_image_resource(resources)?;
    let resource = descriptor.resource.ok_or(MattingError::NoImageResource)?;

    Ok(MatteResponse {
        matte_uri: resource.uri,
        confidence: outputs.confidence.unwrap_or(0.95).clamp(0.0, 1.0),
    })
}
