use crate::workflow::RequestCategory;
use thiserror::Error;

/// Failure modes of a single matting run.
///
/// Every variant is surfaced to the caller as one failed-run outcome;
/// nothing is retried inside the library.
#[derive(Debug, Error)]
pub enum MattingError {
    /// The workflow endpoint rejected the request with a non-2xx status.
    #[error("workflow request rejected with status {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport failed while the response stream was being read.
    #[error("response stream failed: {0}")]
    StreamRead(String),

    /// The stream closed without a workflow-finished event.
    #[error("stream ended without a workflow_finished event")]
    NoTerminalEvent,

    /// The terminal payload's nested outputs content could not be decoded.
    #[error("workflow outputs content could not be parsed: {0}")]
    ContentParse(String),

    /// No decoded resource descriptor qualified as an image.
    #[error("workflow outputs carry no image resource")]
    NoImageResource,

    /// No service config is registered for the resolved category.
    #[error("no service config registered for category {0}")]
    UnsupportedCategory(RequestCategory),

    /// Image bytes could not be decoded into a pixel buffer.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Compositing or encoding failed.
    #[error("image processing failed: {0}")]
    Processing(String),

    /// The composited image has no opaque pixel to crop to.
    #[error("composited image has no opaque content")]
    EmptyContent,
}
