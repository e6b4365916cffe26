//! SSE payload deserialization structs
//!
//! Control payloads are JSON objects. Every field is optional and kept as a
//! raw `Value` because the backend is loose about types; the control parser
//! decides what counts as present.

use serde::Deserialize;

/// Structured data payload carrying session metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ControlPayload {
    /// Conversation assigned by the backend on the first send
    #[serde(rename = "conversationId", default)]
    pub conversation_id: Option<serde_json::Value>,
    /// `"done"` when generation finished
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    /// Error reported mid-stream
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Error body of a non-2xx chat response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBodyPayload {
    #[serde(default)]
    pub error: Option<String>,
}
