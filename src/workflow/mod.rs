mod client;
mod config;
mod event;
mod stream;

pub use client::{encode_data_url, MatteResponse, MatteService, WorkflowClient};
pub use config::{RequestCategory, ServiceConfig, ServiceRoutes};
pub use event::{EventData, EventOutputs, Resource, ResourceDescriptor, StreamEvent};
pub use stream::LineDecoder;
