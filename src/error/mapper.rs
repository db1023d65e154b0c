//! Error mapping utilities for HTTP status codes and error bodies.

use super::categories::*;
use super::types::ChatError;

/// Longest slice of a plain-text error body kept in an error message.
const MAX_BODY_SNIPPET: usize = 512;

/// Maps a non-2xx HTTP status and its response body to a `ChatError`.
///
/// The message is taken from a JSON `error` (string or `{ "message": .. }`)
/// or `message` field when the body carries one, otherwise from the body
/// text, falling back to the canonical reason phrase for an empty body.
/// Every resulting error displays the numeric status.
pub fn map_http_status(status: u16, body: &[u8]) -> ChatError {
    let message = error_message(status, body);

    match status {
        400 | 422 => RequestError::BadRequest { status, message }.into(),
        404 => RequestError::NotFound { status, message }.into(),
        413 => RequestError::PayloadTooLarge { status, message }.into(),
        429 => RequestError::RateLimited {
            status,
            message,
            retry_after: None,
        }
        .into(),
        400..=499 => RequestError::BadRequest { status, message }.into(),
        500 => ServerError::InternalError { status, message }.into(),
        502 => ServerError::BadGateway { status, message }.into(),
        503 => ServerError::ServiceUnavailable {
            status,
            message,
            retry_after: None,
        }
        .into(),
        504 => ServerError::GatewayTimeout { status, message }.into(),
        501..=599 => ServerError::InternalError { status, message }.into(),
        _ => ResponseError::UnexpectedStatus { status, message }.into(),
    }
}

fn error_message(status: u16, body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let from_json = match json.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(error) => error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            None => json
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
        };
        if let Some(message) = from_json {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("no response body")
            .to_string();
    }

    match text.char_indices().nth(MAX_BODY_SNIPPET) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_500_with_empty_body_uses_reason_phrase() {
        let err = map_http_status(500, b"");
        assert_eq!(
            err,
            ChatError::Server(ServerError::InternalError {
                status: 500,
                message: "Internal Server Error".to_string(),
            })
        );
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_map_extracts_json_error_message() {
        let err = map_http_status(400, br#"{"error":{"message":"message is required"}}"#);
        assert_eq!(
            err,
            ChatError::Request(RequestError::BadRequest {
                status: 400,
                message: "message is required".to_string(),
            })
        );

        let err = map_http_status(503, br#"{"error":"model loading"}"#);
        assert!(matches!(
            err,
            ChatError::Server(ServerError::ServiceUnavailable { status: 503, ref message, .. })
                if message == "model loading"
        ));
    }

    #[test]
    fn test_map_plain_text_body() {
        let err = map_http_status(502, b"upstream went away\n");
        assert_eq!(
            err,
            ChatError::Server(ServerError::BadGateway {
                status: 502,
                message: "upstream went away".to_string(),
            })
        );
    }

    #[test]
    fn test_map_status_ranges() {
        assert!(matches!(map_http_status(418, b""), ChatError::Request(RequestError::BadRequest { status: 418, .. })));
        assert!(matches!(map_http_status(429, b""), ChatError::Request(RequestError::RateLimited { .. })));
        assert!(matches!(map_http_status(507, b""), ChatError::Server(ServerError::InternalError { status: 507, .. })));
        assert!(matches!(map_http_status(302, b""), ChatError::Response(ResponseError::UnexpectedStatus { status: 302, .. })));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_BODY_SNIPPET * 2);
        let err = map_http_status(500, body.as_bytes());
        let ChatError::Server(ServerError::InternalError { message, .. }) = err else {
            unreachable!("500 maps to InternalError");
        };
        assert_eq!(message.chars().count(), MAX_BODY_SNIPPET + 1);
    }
}
