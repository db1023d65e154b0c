//! HTTP response parser for the chat backend.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ChatError, RequestError, ServerError, map_http_status};
use super::http::HttpResponse;

/// Parser for HTTP responses from the chat backend.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a successful HTTP response into the expected type.
    ///
    /// Non-2xx statuses are mapped through [`map_http_status`].
    pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ChatError> {
        if (200..300).contains(&response.status) {
            let parsed: T = serde_json::from_slice(&response.body)?;
            Ok(parsed)
        } else {
            Err(Self::parse_error_response(&response))
        }
    }

    /// Maps an error response, filling in `Retry-After` where the variant has room for it.
    pub fn parse_error_response(response: &HttpResponse) -> ChatError {
        let mut error = map_http_status(response.status, &response.body);
        let retry_after = Self::parse_retry_after(&response.headers);

        match &mut error {
            ChatError::Request(RequestError::RateLimited { retry_after: ra, .. })
            | ChatError::Server(ServerError::ServiceUnavailable { retry_after: ra, .. }) => {
                *ra = retry_after;
            }
            _ => {}
        }

        tracing::debug!(
            status = response.status,
            error = %error,
            "Chat API error response"
        );

        error
    }

    /// Parses the Retry-After header (delay in seconds) from the response.
    pub fn parse_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
        headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("retry-after"))
            .and_then(|(_, value)| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}
