//! # Chat Stream Client
//!
//! Rust client for a chat backend that streams assistant replies as a
//! sequence of JSON objects over a chunked HTTP body.
//!
//! ## Features
//!
//! - Incremental frame extraction that is immune to chunk boundaries
//! - Tolerance for SSE framing (`data:` prefixes, comments, heartbeats)
//! - Bounded buffer growth through prefix compaction
//! - Cooperative cancellation with guaranteed release of the response body
//! - Separate reasoning and content events
//! - Non-streaming request support
//! - Mock transport for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use integrations_chat_stream::{ChatClient, ChatConfig, ChatEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatConfig::builder()
//!         .base_url("http://localhost:8080")?
//!         .build()?;
//!     let client = ChatClient::new(config)?;
//!
//!     let mut stream = client.stream_message("Explain ownership in one paragraph")?;
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             ChatEvent::Reasoning(text) => eprint!("{text}"),
//!             ChatEvent::Content(text) => print!("{text}"),
//!             ChatEvent::StreamError(error) => return Err(error.into()),
//!             ChatEvent::StreamComplete => println!(),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - Chat client, event stream and conversations
//! - `config` - Configuration types and builder
//! - `error` - Error types and taxonomy
//! - `streaming` - Byte decoding, frame extraction and session lifecycle
//! - `transport` - HTTP transport layer
//! - `types` - Request and response bodies

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod streaming;
pub mod transport;
pub mod types;

// Testing support - always available for integration tests
pub mod mocks;

pub use client::{ChatClient, ChatStream, Conversation};
pub use config::{
    ChatConfig, ChatConfigBuilder, StreamingConfig, DEFAULT_BASE_URL,
    DEFAULT_COMPACTION_THRESHOLD, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MIN_RECLAIM,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{
    // Main error types
    ChatError,
    ChatResult,
    // Error categories
    ConfigurationError,
    NetworkError,
    RequestError,
    ResponseError,
    ServerError,
    StreamError,
    // Error mapping
    map_http_status,
};
pub use streaming::{
    AssistantReply, BufferManager, ByteDecoder, ChatEvent, Frame, FrameExtractor,
    SessionState, StreamAccumulator, StreamSession,
};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, StreamingResponse,
    TransportError,
};
pub use types::{ChatRequest, ChatResponse};
