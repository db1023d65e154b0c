//! Streaming support for chat responses.
//!
//! The streaming endpoint answers with a chunked body holding a sequence of
//! JSON object literals, each shaped like
//! `{"content": "...", "reasoningContent": "..."}`, optionally wrapped in SSE
//! `data: ` lines and interleaved with `:`/`event:`/`id:`/`retry:` lines.
//!
//! The pipeline for one request:
//! - [`ByteDecoder`] turns byte chunks into text, carrying split UTF-8 sequences
//! - [`BufferManager`] appends the text, runs the [`FrameExtractor`] and
//!   compacts the processed prefix
//! - [`StreamSession`] drives the read loop, emits [`ChatEvent`]s and owns
//!   cancellation and the release of the transport body
//! - [`StreamAccumulator`] optionally folds the events into an [`AssistantReply`]
//!
//! ## Example
//!
//! ```rust
//! use integrations_chat_stream::streaming::{BufferManager, ChatEvent, Frame};
//! use integrations_chat_stream::config::StreamingConfig;
//!
//! let mut buffer = BufferManager::new(StreamingConfig::default());
//! let mut events: Vec<ChatEvent> = Vec::new();
//!
//! for chunk in [r#"{"content":"Hel"#, r#"lo"}: ping"#, "\n{\"content\":\" World\"}"] {
//!     events.extend(buffer.append(chunk).into_iter().flat_map(Frame::into_events));
//! }
//!
//! assert_eq!(
//!     events,
//!     vec![
//!         ChatEvent::Content("Hello".to_string()),
//!         ChatEvent::Content(" World".to_string()),
//!     ]
//! );
//! ```

mod accumulator;
mod buffer;
mod decoder;
mod extractor;
mod frame;
mod session;

pub use accumulator::{AssistantReply, StreamAccumulator};
pub use buffer::{BufferManager, ParserState};
pub use decoder::ByteDecoder;
pub use extractor::{extract_frames, Extraction, FrameExtractor};
pub use frame::{ChatEvent, Frame, CONTENT_FIELD, REASONING_FIELD};
pub use session::{SessionState, StreamSession};
