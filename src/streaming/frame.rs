//! Decoded frames and the events they produce.

use serde_json::{Map, Value};
use crate::error::ChatError;

/// Field carrying answer text.
pub const CONTENT_FIELD: &str = "content";

/// Field carrying reasoning text.
pub const REASONING_FIELD: &str = "reasoningContent";

/// One complete top-level JSON object from the stream, reduced to the fields
/// this client understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Answer text, if the object carried a string `content`.
    pub content: Option<String>,
    /// Reasoning text, if the object carried a string `reasoningContent`.
    pub reasoning_content: Option<String>,
}

impl Frame {
    /// Build a frame from a decoded object.
    ///
    /// Returns `None` when neither field is present as a string. Empty strings
    /// are kept.
    pub fn from_object(mut object: Map<String, Value>) -> Option<Self> {
        let frame = Self {
            content: take_string(&mut object, CONTENT_FIELD),
            reasoning_content: take_string(&mut object, REASONING_FIELD),
        };
        if frame.content.is_none() && frame.reasoning_content.is_none() {
            return None;
        }
        Some(frame)
    }

    /// Events for this frame: `Reasoning` first, then `Content`.
    pub fn into_events(self) -> impl Iterator<Item = ChatEvent> {
        self.reasoning_content
            .map(ChatEvent::Reasoning)
            .into_iter()
            .chain(self.content.map(ChatEvent::Content))
    }
}

fn take_string(object: &mut Map<String, Value>, field: &str) -> Option<String> {
    match object.remove(field)? {
        Value::String(text) => Some(text),
        other => {
            tracing::debug!(field, value = %other, "Ignoring non-string frame field");
            None
        }
    }
}

/// Event delivered to a stream consumer.
///
/// Zero or more `Content`/`Reasoning` events are followed by at most one
/// terminal event. A cancelled session delivers no terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A piece of answer text.
    Content(String),
    /// A piece of reasoning text.
    Reasoning(String),
    /// The session failed; nothing follows.
    StreamError(ChatError),
    /// The stream ended normally; nothing follows.
    StreamComplete,
}

impl ChatEvent {
    /// Returns true for `StreamError` and `StreamComplete`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::StreamError(_) | ChatEvent::StreamComplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_frame_keeps_empty_content() {
        let frame = Frame::from_object(object(json!({ "content": "" }))).unwrap();
        assert_eq!(frame.into_events().collect::<Vec<_>>(), vec![ChatEvent::Content(String::new())]);
    }

    #[test]
    fn test_reasoning_precedes_content() {
        let frame = Frame::from_object(object(json!({ "content": "B", "reasoningContent": "A" }))).unwrap();
        assert_eq!(
            frame.into_events().collect::<Vec<_>>(),
            vec![ChatEvent::Reasoning("A".to_string()), ChatEvent::Content("B".to_string())]
        );
    }

    #[test]
    fn test_unrecognised_fields_yield_no_frame() {
        assert_eq!(Frame::from_object(object(json!({ "usage": { "tokens": 3 } }))), None);
        assert_eq!(Frame::from_object(object(json!({ "content": 42 }))), None);
    }
}
