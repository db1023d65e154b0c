//! Mock implementations for testing.
//!
//! [`MockHttpTransport`] replays queued responses, records requests and
//! counts how often a streaming body was opened and released.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::transport::{
    ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, StreamingResponse,
    TransportError,
};

enum QueuedStream {
    Chunks {
        chunks: Vec<Result<Bytes, TransportError>>,
        content_type: Option<String>,
    },
    Channel(mpsc::UnboundedReceiver<Result<Bytes, TransportError>>),
    NoBody,
    Error(TransportError),
    Pending,
}

/// Body stream that records its own release.
struct TrackedBody {
    inner: ChunkedStream,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedBody {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Feeds a channel-backed streaming body queued with
/// [`MockHttpTransport::enqueue_streaming_channel`].
///
/// The body stays pending until a chunk is sent and ends when the sender is
/// dropped or [`finish`](Self::finish)ed.
#[derive(Clone)]
pub struct MockStreamSender {
    sender: mpsc::UnboundedSender<Result<Bytes, TransportError>>,
}

impl MockStreamSender {
    /// Send a text chunk. Returns false once the body has been released.
    pub fn send_text(&self, text: &str) -> bool {
        self.send_bytes(Bytes::from(text.to_string()))
    }

    /// Send a raw byte chunk. Returns false once the body has been released.
    pub fn send_bytes(&self, bytes: Bytes) -> bool {
        self.sender.send(Ok(bytes)).is_ok()
    }

    /// Fail the body with a transport error.
    pub fn fail(&self, error: TransportError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }

    /// Whether the session dropped the receiving body.
    pub fn is_released(&self) -> bool {
        self.sender.is_closed()
    }

    /// End the body.
    pub fn finish(self) {}
}

/// Mock HTTP transport for testing.
///
/// # Example
///
/// ```
/// use integrations_chat_stream::mocks::MockHttpTransport;
/// use integrations_chat_stream::transport::{HttpTransport, HttpRequest, HttpMethod};
/// use std::collections::HashMap;
///
/// # tokio_test::block_on(async {
/// let transport = MockHttpTransport::new();
/// transport.enqueue_json_response(200, r#"{"content": "ok"}"#);
///
/// let request = HttpRequest {
///     method: HttpMethod::Post,
///     url: "http://localhost:8080/api/chat".to_string(),
///     headers: HashMap::new(),
///     body: None,
///     timeout: None,
/// };
///
/// let response = transport.send(request).await.unwrap();
/// assert_eq!(response.status, 200);
/// transport.verify_request_count(1);
/// # });
/// ```
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    streaming_responses: Mutex<VecDeque<QueuedStream>>,
    requests: Mutex<Vec<HttpRequest>>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHttpTransport {
    /// Create a new mock HTTP transport.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            streaming_responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueue a response to be returned by the next `send`.
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        lock(&self.responses).push_back(response);
    }

    /// Enqueue a JSON response with the given status code and body.
    pub fn enqueue_json_response(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        self.enqueue_response(Ok(HttpResponse {
            status,
            body: Bytes::from(body.to_string()),
            headers,
        }));
    }

    /// Enqueue an error for the next `send`.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// Enqueue a `text/event-stream` body made of the given chunks.
    pub fn enqueue_streaming_response(&self, chunks: Vec<Bytes>) {
        self.enqueue_streaming_results(chunks.into_iter().map(Ok).collect());
    }

    /// Enqueue a `text/event-stream` body made of the given text chunks.
    pub fn enqueue_streaming_text(&self, chunks: &[&str]) {
        self.enqueue_streaming_response(
            chunks.iter().map(|c| Bytes::from(c.to_string())).collect(),
        );
    }

    /// Enqueue a body whose items may include a mid-stream failure.
    pub fn enqueue_streaming_results(&self, chunks: Vec<Result<Bytes, TransportError>>) {
        lock(&self.streaming_responses).push_back(QueuedStream::Chunks {
            chunks,
            content_type: Some("text/event-stream".to_string()),
        });
    }

    /// Enqueue a body with an explicit (or missing) content type.
    pub fn enqueue_streaming_with_content_type(&self, chunks: Vec<Bytes>, content_type: Option<&str>) {
        lock(&self.streaming_responses).push_back(QueuedStream::Chunks {
            chunks: chunks.into_iter().map(Ok).collect(),
            content_type: content_type.map(str::to_string),
        });
    }

    /// Enqueue a body driven by the returned sender.
    pub fn enqueue_streaming_channel(&self) -> MockStreamSender {
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.streaming_responses).push_back(QueuedStream::Channel(receiver));
        MockStreamSender { sender }
    }

    /// Enqueue a 2xx streaming response that carries no body.
    pub fn enqueue_streaming_without_body(&self) {
        lock(&self.streaming_responses).push_back(QueuedStream::NoBody);
    }

    /// Enqueue a non-2xx answer to the next streaming request.
    pub fn enqueue_streaming_status(&self, status: u16, body: &str) {
        self.enqueue_streaming_error(TransportError::Status {
            status,
            body: Bytes::from(body.to_string()),
        });
    }

    /// Enqueue a transport error for the next streaming request.
    pub fn enqueue_streaming_error(&self, error: TransportError) {
        lock(&self.streaming_responses).push_back(QueuedStream::Error(error));
    }

    /// Make the next streaming request wait forever for response headers.
    pub fn enqueue_streaming_pending(&self) {
        lock(&self.streaming_responses).push_back(QueuedStream::Pending);
    }

    /// Get all requests that were made.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Get the last request that was made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Verify that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = lock(&self.requests).len();
        assert_eq!(actual, expected, "Expected {} requests, got {}", expected, actual);
    }

    /// Verify that a request was made with the expected method and URL.
    pub fn verify_request(&self, index: usize, method: HttpMethod, url_contains: &str) {
        let requests = lock(&self.requests);
        let request = requests.get(index).unwrap_or_else(|| {
            panic!("Request index {} out of bounds (total: {})", index, requests.len())
        });
        assert_eq!(request.method, method, "Request method mismatch");
        assert!(
            request.url.contains(url_contains),
            "URL '{}' does not contain '{}'",
            request.url,
            url_contains
        );
    }

    /// Number of streaming bodies handed out.
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of streaming bodies dropped by their reader.
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn track(&self, inner: ChunkedStream) -> ChunkedStream {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Box::pin(TrackedBody {
            inner,
            released: Arc::clone(&self.released),
        })
    }
}

impl Default for MockHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("No mock response queued".to_string())))
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, TransportError> {
        lock(&self.requests).push(request);
        let queued = lock(&self.streaming_responses).pop_front();

        let event_stream = || {
            let mut headers = HashMap::new();
            headers.insert("content-type".to_string(), "text/event-stream".to_string());
            headers
        };

        match queued {
            Some(QueuedStream::Chunks { chunks, content_type }) => {
                let headers = content_type
                    .map(|ct| HashMap::from([("content-type".to_string(), ct)]))
                    .unwrap_or_default();
                let body = self.track(Box::pin(futures::stream::iter(chunks)));
                Ok(StreamingResponse {
                    status: 200,
                    headers,
                    body: Some(body),
                })
            }
            Some(QueuedStream::Channel(receiver)) => {
                let stream = futures::stream::unfold(receiver, |mut receiver| async move {
                    receiver.recv().await.map(|item| (item, receiver))
                });
                Ok(StreamingResponse {
                    status: 200,
                    headers: event_stream(),
                    body: Some(self.track(Box::pin(stream))),
                })
            }
            Some(QueuedStream::NoBody) => Ok(StreamingResponse {
                status: 200,
                headers: event_stream(),
                body: None,
            }),
            Some(QueuedStream::Error(error)) => Err(error),
            Some(QueuedStream::Pending) => futures::future::pending().await,
            None => Err(TransportError::Connection(
                "No mock streaming response queued".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: "http://localhost:8080/api/chat/streaming".to_string(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_streaming_body_release_is_counted() {
        let transport = MockHttpTransport::new();
        transport.enqueue_streaming_text(&["a", "b"]);

        let response = transport.send_streaming(request()).await.unwrap();
        let mut body = response.body.unwrap();
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from("a"));
        assert_eq!(transport.release_count(), 0);

        drop(body);
        assert_eq!(transport.opened_count(), 1);
        assert_eq!(transport.release_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_body_reports_release() {
        let transport = MockHttpTransport::new();
        let sender = transport.enqueue_streaming_channel();

        let response = transport.send_streaming(request()).await.unwrap();
        let mut body = response.body.unwrap();
        assert!(sender.send_text("x"));
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from("x"));

        drop(body);
        assert!(sender.is_released());
        assert!(!sender.send_text("y"));
    }

    #[tokio::test]
    async fn test_status_error_is_returned() {
        let transport = MockHttpTransport::new();
        transport.enqueue_streaming_status(500, "");

        let result = transport.send_streaming(request()).await;
        assert!(matches!(result, Err(TransportError::Status { status: 500, .. })));
        transport.verify_request(0, HttpMethod::Post, "/api/chat/streaming");
    }
}
