//! Folding a sequence of chat events into a final reply.

use crate::error::{ChatError, ChatResult};
use super::frame::ChatEvent;

/// Text accumulated from one streaming session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantReply {
    /// Concatenated `Content` payloads.
    pub content: String,
    /// Concatenated `Reasoning` payloads.
    pub reasoning: String,
    /// Number of `Content` events, including empty ones.
    pub content_events: usize,
    /// Number of `Reasoning` events, including empty ones.
    pub reasoning_events: usize,
    /// Whether `StreamComplete` was seen. False for a cancelled session.
    pub complete: bool,
}

/// Accumulator for combining streamed events.
///
/// Events after the first terminal event are ignored.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    reply: AssistantReply,
    error: Option<ChatError>,
}

impl StreamAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the accumulated state.
    pub fn add_event(&mut self, event: ChatEvent) {
        if self.is_finished() {
            return;
        }
        match event {
            ChatEvent::Content(text) => {
                self.reply.content.push_str(&text);
                self.reply.content_events += 1;
            }
            ChatEvent::Reasoning(text) => {
                self.reply.reasoning.push_str(&text);
                self.reply.reasoning_events += 1;
            }
            ChatEvent::StreamError(error) => self.error = Some(error),
            ChatEvent::StreamComplete => self.reply.complete = true,
        }
    }

    /// Answer text so far.
    pub fn content(&self) -> &str {
        &self.reply.content
    }

    /// Reasoning text so far.
    pub fn reasoning(&self) -> &str {
        &self.reply.reasoning
    }

    /// Whether any `Content` event arrived, even an empty one.
    pub fn has_content(&self) -> bool {
        self.reply.content_events > 0
    }

    /// Whether a terminal event has been seen.
    pub fn is_finished(&self) -> bool {
        self.reply.complete || self.error.is_some()
    }

    /// Return the reply, or the error that ended the stream.
    pub fn finalize(self) -> ChatResult<AssistantReply> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.reply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;

    #[test]
    fn test_accumulates_both_columns() {
        let mut acc = StreamAccumulator::new();
        acc.add_event(ChatEvent::Reasoning("think ".to_string()));
        acc.add_event(ChatEvent::Content("Hel".to_string()));
        acc.add_event(ChatEvent::Reasoning("more".to_string()));
        acc.add_event(ChatEvent::Content("lo".to_string()));
        acc.add_event(ChatEvent::StreamComplete);

        let reply = acc.finalize().unwrap();
        assert_eq!(reply.content, "Hello");
        assert_eq!(reply.reasoning, "think more");
        assert_eq!(reply.content_events, 2);
        assert!(reply.complete);
    }

    #[test]
    fn test_empty_content_is_counted() {
        let mut acc = StreamAccumulator::new();
        assert!(!acc.has_content());
        acc.add_event(ChatEvent::Content(String::new()));
        assert!(acc.has_content());
        assert_eq!(acc.content(), "");
    }

    #[test]
    fn test_error_wins_and_later_events_are_ignored() {
        let mut acc = StreamAccumulator::new();
        acc.add_event(ChatEvent::Content("partial".to_string()));
        acc.add_event(ChatEvent::StreamError(StreamError::MissingBody.into()));
        acc.add_event(ChatEvent::Content("late".to_string()));
        acc.add_event(ChatEvent::StreamComplete);

        assert_eq!(acc.content(), "partial");
        assert_eq!(acc.finalize(), Err(ChatError::Stream(StreamError::MissingBody)));
    }

    #[test]
    fn test_unfinished_stream_is_incomplete() {
        let mut acc = StreamAccumulator::new();
        acc.add_event(ChatEvent::Content("cut".to_string()));
        let reply = acc.finalize().unwrap();
        assert!(!reply.complete);
    }
}
