//! Background matting via a remote workflow service.
//!
//! The segmentation decision is delegated to a streaming workflow
//! endpoint; the transparent-background result is reconstructed locally
//! by converting the returned grayscale matte into an alpha channel,
//! fusing it with the original (destination-in) and cropping to the
//! content bounds.

pub mod compositing;
pub mod error;
pub mod pipeline;
pub mod workflow;

pub use error::MattingError;
pub use pipeline::{ImageSource, MattingEngine, MattingResult, ProcessingStatus};
pub use workflow::{
    MatteResponse, MatteService, RequestCategory, ServiceConfig, ServiceRoutes, WorkflowClient,
};
