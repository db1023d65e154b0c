//! Lifecycle of one streaming request.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::StreamingConfig;
use crate::error::{ChatError, StreamError};
use crate::transport::{endpoints, ChunkedStream, HttpRequest, HttpTransport, StreamingResponse, TransportError};
use super::buffer::BufferManager;
use super::decoder::ByteDecoder;
use super::frame::{ChatEvent, Frame};

/// State of a streaming session. Every state but `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The request is in flight or the body is being read.
    Active,
    /// The body ended and `StreamComplete` was delivered.
    Completed,
    /// A transport failure ended the session and `StreamError` was delivered.
    Failed,
    /// The consumer cancelled the session; no terminal event was delivered.
    Cancelled,
}

impl SessionState {
    /// Returns true for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Active => "active",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Holds the body reader for the session and releases it exactly once.
struct ReaderGuard {
    body: Option<ChunkedStream>,
}

impl ReaderGuard {
    fn new(body: ChunkedStream) -> Self {
        Self { body: Some(body) }
    }

    async fn next(&mut self) -> Option<Result<Bytes, TransportError>> {
        match self.body.as_mut() {
            Some(body) => body.next().await,
            None => None,
        }
    }

    fn release(&mut self) {
        if let Some(body) = self.body.take() {
            drop(body);
            tracing::debug!("Released transport reader");
        }
    }
}

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Forwards events to the consumer until cancellation is requested.
struct Emitter<'a, F> {
    sink: &'a mut F,
    cancel: &'a CancellationToken,
    delivered: usize,
}

impl<F: FnMut(ChatEvent)> Emitter<'_, F> {
    fn emit(&mut self, event: ChatEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.delivered += 1;
        (self.sink)(event);
    }

    fn emit_frames(&mut self, frames: Vec<Frame>) {
        for event in frames.into_iter().flat_map(Frame::into_events) {
            self.emit(event);
        }
    }
}

enum ReadOutcome {
    Completed,
    Failed(ChatError),
    Cancelled,
}

/// One logical streaming request.
///
/// The session owns the transport body for its whole lifetime. Bytes flow
/// through a [`ByteDecoder`] into a [`BufferManager`]; every completed frame
/// becomes one or two events handed to the consumer in arrival order.
///
/// Cancellation is cooperative: the token is checked before each read, and a
/// read that is already waiting is abandoned as soon as the token fires. The
/// body reader is released once on every exit path.
pub struct StreamSession {
    id: Uuid,
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    streaming: StreamingConfig,
    cancel: CancellationToken,
    state: SessionState,
    observer: Option<watch::Sender<SessionState>>,
}

impl StreamSession {
    /// Create a session for a prepared streaming request.
    pub fn new(transport: Arc<dyn HttpTransport>, request: HttpRequest, streaming: StreamingConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            request,
            streaming,
            cancel: CancellationToken::new(),
            state: SessionState::Active,
            observer: None,
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Publish every state change on the given channel.
    pub fn with_state_observer(mut self, observer: watch::Sender<SessionState>) -> Self {
        observer.send_replace(self.state);
        self.observer = Some(observer);
        self
    }

    /// Session id used in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token that cancels this session when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the session to a terminal state, handing each event to `on_event`.
    pub async fn run<F>(mut self, mut on_event: F) -> SessionState
    where
        F: FnMut(ChatEvent) + Send,
    {
        let span = tracing::info_span!("chat.stream", session_id = %self.id);
        self.drive(&mut on_event).instrument(span).await
    }

    async fn drive<F>(&mut self, on_event: &mut F) -> SessionState
    where
        F: FnMut(ChatEvent) + Send,
    {
        let cancel = self.cancel.clone();
        let mut emitter = Emitter {
            sink: on_event,
            cancel: &cancel,
            delivered: 0,
        };

        let transport = Arc::clone(&self.transport);
        let request = self.request.clone();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            response = transport.send_streaming(request) => Some(response),
        };

        let response = match response {
            None => return self.cancelled(&emitter),
            Some(Ok(response)) => response,
            Some(Err(error)) => return self.fail(ChatError::from(error), &mut emitter),
        };

        warn_on_content_type(&response);

        let Some(body) = response.body else {
            return self.fail(StreamError::MissingBody.into(), &mut emitter);
        };

        let mut reader = ReaderGuard::new(body);
        let outcome = self.read_loop(&mut reader, &mut emitter).await;
        reader.release();

        match outcome {
            ReadOutcome::Completed => {
                if cancel.is_cancelled() {
                    return self.cancelled(&emitter);
                }
                self.transition(SessionState::Completed);
                emitter.emit(ChatEvent::StreamComplete);
                tracing::info!(events = emitter.delivered, "Stream completed");
                self.state
            }
            ReadOutcome::Failed(error) => self.fail(error, &mut emitter),
            ReadOutcome::Cancelled => self.cancelled(&emitter),
        }
    }

    async fn read_loop<F>(&self, reader: &mut ReaderGuard, emitter: &mut Emitter<'_, F>) -> ReadOutcome
    where
        F: FnMut(ChatEvent) + Send,
    {
        let cancel = emitter.cancel;
        let mut decoder = ByteDecoder::new();
        let mut buffer = BufferManager::new(self.streaming);
        let mut received = 0usize;

        loop {
            if cancel.is_cancelled() {
                return ReadOutcome::Cancelled;
            }

            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return ReadOutcome::Cancelled,
                next = reader.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    received += chunk.len();
                    let text = decoder.decode(&chunk);
                    let frames = buffer.append(&text);
                    tracing::debug!(
                        chunk_bytes = chunk.len(),
                        buffered = buffer.len(),
                        watermark = buffer.watermark(),
                        frames = frames.len(),
                        "Processed chunk"
                    );
                    emitter.emit_frames(frames);
                }
                Some(Err(error)) => return ReadOutcome::Failed(error.into()),
                None => {
                    if let Err(error) = decoder.flush() {
                        return ReadOutcome::Failed(error.into());
                    }
                    emitter.emit_frames(buffer.finish());
                    tracing::debug!(
                        received,
                        compactions = buffer.compactions(),
                        reclaimed = buffer.reclaimed(),
                        "End of stream"
                    );
                    return ReadOutcome::Completed;
                }
            }
        }
    }

    fn fail<F>(&mut self, error: ChatError, emitter: &mut Emitter<'_, F>) -> SessionState
    where
        F: FnMut(ChatEvent) + Send,
    {
        if emitter.cancel.is_cancelled() {
            return self.cancelled(emitter);
        }
        tracing::error!(error = %error, "Stream failed");
        self.transition(SessionState::Failed);
        emitter.emit(ChatEvent::StreamError(error));
        self.state
    }

    fn cancelled<F>(&mut self, emitter: &Emitter<'_, F>) -> SessionState {
        tracing::info!(events = emitter.delivered, "Stream cancelled");
        self.transition(SessionState::Cancelled);
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(!self.state.is_terminal(), "session already {}", self.state);
        self.state = next;
        if let Some(observer) = &self.observer {
            observer.send_replace(next);
        }
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("url", &self.request.url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn warn_on_content_type(response: &StreamingResponse) {
    let content_type = response.content_type();
    let is_event_stream = content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == endpoints::EVENT_STREAM_CONTENT_TYPE);
    if !is_event_stream {
        tracing::warn!(
            content_type = content_type.unwrap_or("<none>"),
            "Streaming response is not text/event-stream; parsing frames anyway"
        );
    }
}
