//! Request and response bodies of the chat endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of both `POST /api/chat` and `POST /api/chat/streaming`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

impl ChatRequest {
    /// Create a request for the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful `POST /api/chat` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub content: String,
    /// Any further response fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_keeps_unknown_fields() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"content":"Paris","model":"m-1","latencyMs":12}"#).unwrap();
        assert_eq!(response.content, "Paris");
        assert_eq!(response.extra.get("model"), Some(&Value::from("m-1")));
        assert_eq!(response.extra.len(), 2);
    }

    #[test]
    fn test_response_requires_content() {
        assert!(serde_json::from_str::<ChatResponse>(r#"{"model":"m-1"}"#).is_err());
    }
}
