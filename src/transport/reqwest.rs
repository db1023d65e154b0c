//! Reqwest-based HTTP transport implementation.

use super::http::{HttpTransport, HttpRequest, HttpResponse, HttpMethod, StreamingResponse};
use super::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use futures::StreamExt;

/// Reqwest-based HTTP transport.
///
/// The client carries only a connect timeout; total timeouts are applied per
/// request so streaming bodies are not cut off mid-generation.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new reqwest transport.
    pub fn new(connect_timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Convert HttpMethod to reqwest::Method.
    fn convert_method(&self, method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    /// Convert headers HashMap to reqwest::header::HeaderMap.
    fn convert_headers(&self, headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    /// Convert reqwest::header::HeaderMap to HashMap.
    fn extract_headers(&self, headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: HttpRequest) -> Result<reqwest::Response, TransportError> {
        let method = self.convert_method(request.method);
        let headers = self.convert_headers(request.headers);

        let mut req_builder = self.client
            .request(method, &request.url)
            .headers(headers);

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        req_builder
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.execute(request).await?;

        let status = response.status().as_u16();
        let response_headers = self.extract_headers(response.headers());
        let body = response.bytes().await
            .map_err(|e| TransportError::Request(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        let response = self.execute(request).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.bytes().await
                .map_err(|e| TransportError::Request(format!("Failed to read error response: {}", e)))?;
            return Err(TransportError::Status { status, body });
        }

        let status = response.status().as_u16();
        let headers = self.extract_headers(response.headers());
        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Request(format!("Stream error: {}", e))
                }
            })
        });

        Ok(StreamingResponse {
            status,
            headers,
            body: Some(Box::pin(stream)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_transport_creation() {
        let transport = ReqwestTransport::new(Duration::from_secs(10), "test-agent");
        assert!(transport.is_ok());
    }
}
