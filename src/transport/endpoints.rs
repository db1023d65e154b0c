//! Endpoint paths of the chat backend.

/// Non-streaming chat endpoint.
pub const CHAT: &str = "/api/chat";

/// Streaming chat endpoint.
pub const CHAT_STREAMING: &str = "/api/chat/streaming";

/// Content type a well-behaved streaming endpoint answers with.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
