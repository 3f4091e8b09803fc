use anyhow::{Context, Result};
use clap::Parser;
use cutout::{
    ImageSource, MattingEngine, RequestCategory, ServiceConfig, ServiceRoutes, WorkflowClient,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source image: local file path or http(s) URL
    input: String,

    /// Output path for the composited PNG
    #[arg(short, long, default_value = "cutout.png")]
    output: PathBuf,

    /// Matting category requested from the workflow service
    #[arg(short, long, value_enum, default_value_t = RequestCategory::Auto)]
    category: RequestCategory,

    /// Workflow service base URL
    #[arg(long)]
    endpoint: String,

    /// Bearer credential for the workflow service
    /// Falls back to the CUTOUT_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,

    /// Also write the raw matte next to the output
    #[arg(long)]
    save_matte: bool,

    /// Keep the full canvas instead of cropping to the content bounds
    #[arg(long)]
    no_crop: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cutout starting");
    tracing::info!("Input: {}", args.input);
    tracing::info!("Category: {}", args.category);
    tracing::info!("Endpoint: {}", args.endpoint);

    let api_key = args
        .api_key
        .or_else(|| std::env::var("CUTOUT_API_KEY").ok())
        .context("No credential given: pass --api-key or set CUTOUT_API_KEY")?;

    // Category routing table, built once and read-only afterwards.
    let mut routes = ServiceRoutes::new();
    for category in [
        RequestCategory::Portrait,
        RequestCategory::Product,
        RequestCategory::Graphic,
    ] {
        routes.register(category, ServiceConfig::new(&args.endpoint, &api_key));
    }

    let client = WorkflowClient::new(routes);
    let mut engine = MattingEngine::new(Box::new(client))
        .with_crop(!args.no_crop)
        .with_matte_kept(args.save_matte);

    let source = load_source(&args.input).context("Failed to load source image")?;

    let started = Instant::now();
    let result = engine
        .process_image(source, args.category)
        .await
        .context("Matting pipeline failed")?;

    std::fs::write(&args.output, &result.result_png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!(
        "Result written to {} ({} bytes)",
        args.output.display(),
        result.result_png.len()
    );

    if let Some(matte_png) = &result.matte_png {
        let matte_path = sibling_path(&args.output, "-matte");
        std::fs::write(&matte_path, matte_png)
            .with_context(|| format!("Failed to write {}", matte_path.display()))?;
        tracing::info!("Matte written to {}", matte_path.display());
    }

    tracing::info!(
        "Done: confidence={:.2}, pipeline={}ms, wall={:.1}ms",
        result.confidence,
        result.processing_time_ms,
        started.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Resolve the CLI input into a pipeline source.
///
/// URLs are submitted by reference; local files are read and submitted
/// inline as a data URL.
fn load_source(input: &str) -> Result<ImageSource> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(ImageSource::Url(input.to_string()));
    }

    let path = Path::new(input);
    let data = std::fs::read(path).with_context(|| format!("Failed to read {input}"))?;
    Ok(ImageSource::Bytes {
        name: input.to_string(),
        mime: mime_for_path(path).to_string(),
        data,
    })
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

/// `out.png` + `-matte` -> `out-matte.png`
fn sibling_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cutout");
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    output.with_file_name(format!("{stem}{suffix}.{extension}"))
}
