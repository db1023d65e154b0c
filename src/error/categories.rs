//! Error category types for granular error handling.

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Errors raised before or while building a request, and 4xx responses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Failed to serialize request: {message}")]
    Serialization { message: String },

    #[error("Bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Endpoint not found ({status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("Payload too large ({status}): {message}")]
    PayloadTooLarge { status: u16, message: String },

    #[error("Rate limited ({status}): {message}")]
    RateLimited {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },
}

/// Network-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Stream interrupted: {message}")]
    StreamInterrupted { message: String },
}

/// Server-side (5xx) errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Internal server error ({status}): {message}")]
    InternalError { status: u16, message: String },

    #[error("Bad gateway ({status}): {message}")]
    BadGateway { status: u16, message: String },

    #[error("Service unavailable ({status}): {message}")]
    ServiceUnavailable {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Gateway timeout ({status}): {message}")]
    GatewayTimeout { status: u16, message: String },
}

/// Response decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("Failed to deserialize response: {message}")]
    DeserializationError { message: String },

    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
}

/// Errors that end a streaming session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("No response body")]
    MissingBody,

    #[error("Malformed byte sequence at end of stream: {pending} trailing byte(s) do not form a character")]
    IncompleteCharacter { pending: usize },
}

impl RequestError {
    /// Returns the retry-after hint if the server supplied one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RequestError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
