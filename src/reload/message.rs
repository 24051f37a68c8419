//! Live Preview Message Protocol
//!
//! Defines the JSON message format pushed from the preview server to
//! viewer clients. Server -> client only; clients never send anything.
//!
//! # Message Types
//!
//! - `raml`: the full generated document (`data`)
//! - `generating-json`: regeneration in progress
//! - `error`: `level` (`critical` or anything else) plus `message`

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of an error pushed to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    /// Blocks the viewer until the next document arrives.
    Critical,
    /// Transient notification. Any level other than `critical` parses as this.
    #[serde(other)]
    Warning,
}

impl ErrorLevel {
    pub fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// Live preview message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload")]
pub enum Message {
    /// Full generated document
    #[serde(rename = "raml")]
    Document { data: Value },

    /// Regeneration in progress
    #[serde(rename = "generating-json")]
    Loading,

    /// Production failure or other notice
    #[serde(rename = "error")]
    Error { level: ErrorLevel, message: String },
}

impl Message {
    /// Create a document message
    pub fn document(data: Value) -> Self {
        Self::Document { data }
    }

    /// Create a loading message
    pub fn loading() -> Self {
        Self::Loading
    }

    /// Create an error message
    pub fn error(level: ErrorLevel, message: impl Into<String>) -> Self {
        Self::Error {
            level,
            message: message.into(),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::Loading => "loading",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        // Only fails for maps with non-string keys, which `Value` never has.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"payload":"generating-json"}"#.into())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_wire_format() {
        let msg = Message::document(json!({"title": "x"}));
        let value: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value, json!({"payload": "raml", "data": {"title": "x"}}));
    }

    #[test]
    fn test_loading_has_no_extra_fields() {
        let value: Value = serde_json::from_str(&Message::loading().to_json()).unwrap();
        assert_eq!(value, json!({"payload": "generating-json"}));
    }

    #[test]
    fn test_error_wire_format() {
        let msg = Message::error(ErrorLevel::Critical, "bad input");
        let value: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"payload": "error", "level": "critical", "message": "bad input"})
        );
    }

    #[test]
    fn test_unknown_level_is_warning() {
        let msg = Message::from_json(r#"{"payload":"error","level":"info","message":"m"}"#);
        assert_eq!(msg, Some(Message::error(ErrorLevel::Warning, "m")));
    }

    #[test]
    fn test_unknown_payload_rejected() {
        assert!(Message::from_json(r#"{"payload":"reload"}"#).is_none());
        assert!(Message::from_json("not json").is_none());
    }
}
