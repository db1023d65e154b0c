//! HTTP request builder for the chat backend.
//!
//! This module provides the `RequestBuilder` for constructing HTTP requests
//! with the right URL, headers and serialized JSON body.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::{ChatError, RequestError};
use super::http::{HttpRequest, HttpMethod};

/// Builder for constructing HTTP requests to the chat backend.
///
/// The `RequestBuilder` handles:
/// - URL construction relative to the configured base URL
/// - Header management (Content-Type, Accept, custom headers)
/// - Request body serialization
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    /// Base URL, always ending in `/`.
    base_url: Url,
    /// Total timeout attached to built requests.
    timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Creates a new request builder.
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            timeout: None,
        }
    }

    /// Attach a total timeout to every request built from here on.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a complete URL for the given endpoint path.
    ///
    /// The path is resolved below the base URL, so a base of
    /// `https://host/prefix` and a path of `/api/chat` yield
    /// `https://host/prefix/api/chat`.
    ///
    /// ```
    /// use integrations_chat_stream::transport::RequestBuilder;
    /// use url::Url;
    ///
    /// let builder = RequestBuilder::new(Url::parse("https://chat.example.com/v2").unwrap());
    /// let url = builder.build_url("/api/chat").unwrap();
    /// assert_eq!(url.as_str(), "https://chat.example.com/v2/api/chat");
    /// ```
    pub fn build_url(&self, path: &str) -> Result<Url, ChatError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Builds an HTTP request with a JSON body.
    pub fn build_request<T: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&T>,
        extra_headers: Option<Vec<(String, String)>>,
    ) -> Result<HttpRequest, ChatError> {
        let url = self.build_url(path)?;

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let body = match body {
            Some(b) => {
                let json = serde_json::to_vec(b).map_err(|e| RequestError::Serialization {
                    message: e.to_string(),
                })?;
                Some(Bytes::from(json))
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_url_with_root_base() {
        let builder = RequestBuilder::new(Url::parse("http://localhost:8080").unwrap());
        let url = builder.build_url("/api/chat/streaming").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/chat/streaming");
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let builder = RequestBuilder::new(Url::parse("https://example.com/proxy").unwrap());
        let url = builder.build_url("/api/chat").unwrap();
        assert_eq!(url.as_str(), "https://example.com/proxy/api/chat");
    }

    #[test]
    fn test_build_request_sets_json_body_and_headers() {
        let builder = RequestBuilder::new(Url::parse("http://localhost:8080").unwrap())
            .with_timeout(Duration::from_secs(5));
        let request = builder
            .build_request(
                HttpMethod::Post,
                "/api/chat",
                Some(&json!({ "message": "hi" })),
                Some(vec![("accept".to_string(), "text/event-stream".to_string())]),
            )
            .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(request.headers.get("accept").map(String::as_str), Some("text/event-stream"));
        assert_eq!(request.body.as_deref(), Some(br#"{"message":"hi"}"#.as_slice()));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }
}
