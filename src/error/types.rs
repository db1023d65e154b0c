//! Main error type for the chat stream client.

use std::time::Duration;
use thiserror::Error;
use super::categories::*;
use super::mapper::map_http_status;
use crate::transport::TransportError;

/// Result type alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Top-level error type for the chat stream client.
///
/// Errors are cloneable so a failed session can hand the cause to its
/// consumer inside a [`ChatEvent::StreamError`](crate::streaming::ChatEvent).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

impl ChatError {
    /// Returns true for the failures that end a streaming session in `Failed`.
    ///
    /// Configuration and request-validation errors happen before any session
    /// exists and are reported to the caller directly.
    pub fn is_transport_failure(&self) -> bool {
        match self {
            ChatError::Network(_)
            | ChatError::Server(_)
            | ChatError::Response(_)
            | ChatError::Stream(_) => true,
            ChatError::Request(e) => !matches!(
                e,
                RequestError::EmptyMessage | RequestError::Serialization { .. }
            ),
            ChatError::Configuration(_) => false,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Request(
                RequestError::BadRequest { status, .. }
                | RequestError::NotFound { status, .. }
                | RequestError::PayloadTooLarge { status, .. }
                | RequestError::RateLimited { status, .. },
            )
            | ChatError::Server(
                ServerError::InternalError { status, .. }
                | ServerError::BadGateway { status, .. }
                | ServerError::ServiceUnavailable { status, .. }
                | ServerError::GatewayTimeout { status, .. },
            )
            | ChatError::Response(ResponseError::UnexpectedStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Returns the retry-after duration if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ChatError::Request(e) => e.retry_after(),
            ChatError::Server(ServerError::ServiceUnavailable { retry_after, .. }) => *retry_after,
            _ => None,
        }
    }
}

impl From<TransportError> for ChatError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ChatError::Network(NetworkError::Timeout),
            TransportError::Connection(message) => {
                ChatError::Network(NetworkError::ConnectionFailed { message })
            }
            TransportError::Request(message) => {
                ChatError::Network(NetworkError::StreamInterrupted { message })
            }
            TransportError::Status { status, body } => map_http_status(status, &body),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Response(ResponseError::DeserializationError {
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for ChatError {
    fn from(err: url::ParseError) -> Self {
        ChatError::Configuration(ConfigurationError::InvalidBaseUrl {
            url: err.to_string(),
        })
    }
}
