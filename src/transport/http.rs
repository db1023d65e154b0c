//! Core HTTP transport abstractions for the chat stream client.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use futures::Stream;

use super::error::TransportError;

/// HTTP request for the transport layer.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
    /// Total timeout for this request, if bounded.
    pub timeout: Option<Duration>,
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP response from the transport layer.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

/// Chunked byte stream for streaming responses.
pub type ChunkedStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A successful (2xx) streaming response whose body has not been read yet.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased names.
    pub headers: HashMap<String, String>,
    /// Pull-based body reader; `None` when the response carried no body.
    pub body: Option<ChunkedStream>,
}

impl StreamingResponse {
    /// Returns the `content-type` header value, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// HTTP transport abstraction for testability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request and receive a response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Send a streaming request and receive the response with an unread body.
    ///
    /// Non-2xx statuses are reported as [`TransportError::Status`].
    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError>;
}
