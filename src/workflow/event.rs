use crate::error::MattingError;
use serde::Deserialize;

/// Prefix marking a line of the response stream as an encoded event.
pub const DATA_PREFIX: &str = "data: ";

/// Tag of the terminal event carrying the workflow outputs.
pub const FINISHED_EVENT: &str = "workflow_finished";

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif", ".bmp"];

/// One decoded record of the response stream.
#[derive(Debug, Deserialize)]
pub struct StreamEvent {
    pub event: String,
    #[serde(default)]
    pub data: Option<EventData>,
}

/// Payload of a stream event.
#[derive(Debug, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub outputs: Option<EventOutputs>,
}

#[derive(Debug, Deserialize)]
pub struct EventOutputs {
    /// Nested JSON document holding the resource descriptors.
    pub content: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Reference to one output artifact of the workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub resource: Option<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    pub uri: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
}

impl StreamEvent {
    /// Take the terminal payload out of this event, if it is one.
    ///
    /// An event is terminal iff it carries the finished tag and a payload.
    pub fn into_terminal_payload(self) -> Option<EventData> {
        if self.event == FINISHED_EVENT {
            self.data
        } else {
            None
        }
    }
}

impl ResourceDescriptor {
    /// Whether this descriptor references an image artifact.
    pub fn is_image(&self) -> bool {
        if self.kind != "resource" {
            return false;
        }
        let Some(resource) = &self.resource else {
            return false;
        };
        if resource.mime_type.to_ascii_lowercase().contains("image") {
            return true;
        }
        // Fall back to the uri suffix, ignoring any query or fragment.
        let path = resource
            .uri
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        IMAGE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
    }
}

/// Parse one stream line into an event.
///
/// Lines without the data prefix and lines whose payload is not valid
/// JSON are heartbeats or comments; both yield `None` and are skipped.
pub fn parse_event_line(line: &str) -> Option<StreamEvent> {
    let encoded = line.strip_prefix(DATA_PREFIX)?;
    serde_json::from_str(encoded).ok()
}

/// Decode the nested resource-descriptor document of a terminal payload.
pub fn decode_resources(content: &str) -> Result<Vec<ResourceDescriptor>, MattingError> {
    serde_json::from_str(content).map_err(|e| MattingError::ContentParse(e.to_string()))
}

/// Pick the first descriptor referencing an image artifact.
pub fn select_image_resource(
    resources: Vec<ResourceDescriptor>,
) -> Result<ResourceDescriptor, MattingError> {
    resources
        .into_iter()
        .find(ResourceDescriptor::is_image)
        .ok_or(MattingError::NoImageResource)
}
