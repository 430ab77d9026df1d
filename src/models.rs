/// Message shapes exchanged with callers and with the upstream Messages API.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a `POST /extract` call. Only `prompt` is recognised; other keys are ignored.
///
/// The prompt is kept as raw JSON and forwarded as-is, so callers may send either a plain string
/// or an array of content blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRequest {
    pub prompt: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Value,
}

/// The body sent upstream. Always a single user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamChatRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub api_key_set: bool,
}

impl HealthReport {
    pub fn healthy(api_key_set: bool) -> Self {
        HealthReport {
            status: "healthy".into(),
            api_key_set,
        }
    }
}
