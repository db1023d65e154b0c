//! Consumer side of a spawned streaming session.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ChatResult;
use crate::streaming::{AssistantReply, ChatEvent, SessionState, StreamAccumulator};

/// Events of one streaming session, in arrival order.
///
/// Once cancellation has been requested the stream yields nothing more, even
/// if events were already queued. Dropping the stream cancels the session.
pub struct ChatStream {
    session_id: Uuid,
    events: mpsc::UnboundedReceiver<ChatEvent>,
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
}

impl ChatStream {
    pub(crate) fn new(
        session_id: Uuid,
        events: mpsc::UnboundedReceiver<ChatEvent>,
        cancel: CancellationToken,
        state: watch::Receiver<SessionState>,
    ) -> Self {
        Self {
            session_id,
            events,
            cancel,
            state,
        }
    }

    /// Id of the underlying session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Latest state of the underlying session.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Request cancellation. The transport body is released by the session task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the session reaches a terminal state.
    pub async fn finished(&mut self) -> SessionState {
        wait_terminal(&mut self.state).await
    }

    /// Drain the stream into an [`AssistantReply`].
    pub async fn collect_reply(mut self) -> ChatResult<AssistantReply> {
        let mut accumulator = StreamAccumulator::new();
        while let Some(event) = self.next().await {
            accumulator.add_event(event);
        }
        accumulator.finalize()
    }
}

impl Stream for ChatStream {
    type Item = ChatEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        this.events.poll_recv(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Resolve once the observed state is terminal, or the session task is gone.
pub(crate) async fn wait_terminal(state: &mut watch::Receiver<SessionState>) -> SessionState {
    let outcome = state.wait_for(|s| s.is_terminal()).await.map(|s| *s);
    match outcome {
        Ok(terminal) => terminal,
        Err(_) => *state.borrow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::client::ChatClient;
    use crate::config::ChatConfig;
    use crate::mocks::MockHttpTransport;

    #[tokio::test]
    async fn test_stream_yields_events_then_ends() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_streaming_text(&[r#"{"reasoningContent":"think","content":"Hi"}"#]);
        let client = ChatClient::with_transport(ChatConfig::default(), transport.clone());

        let events: Vec<_> = client.stream_message("hello").unwrap().collect().await;

        assert_eq!(
            events,
            vec![
                ChatEvent::Reasoning("think".to_string()),
                ChatEvent::Content("Hi".to_string()),
                ChatEvent::StreamComplete,
            ]
        );
        assert_eq!(transport.release_count(), 1);
    }

    #[tokio::test]
    async fn test_collect_reply() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_streaming_text(&[r#"{"content":"Hel"#, r#"lo"}{"content":"!"}"#]);
        let client = ChatClient::with_transport(ChatConfig::default(), transport);

        let reply = client.stream_message("hello").unwrap().collect_reply().await.unwrap();
        assert_eq!(reply.content, "Hello!");
        assert!(reply.complete);
    }

    #[tokio::test]
    async fn test_cancel_ends_stream_and_releases_body() {
        let transport = Arc::new(MockHttpTransport::new());
        let sender = transport.enqueue_streaming_channel();
        let client = ChatClient::with_transport(ChatConfig::default(), transport.clone());

        let mut stream = client.stream_message("hello").unwrap();
        sender.send_text(r#"{"content":"first"}"#);
        assert_eq!(stream.next().await, Some(ChatEvent::Content("first".to_string())));

        stream.cancel();
        sender.send_text(r#"{"content":"late"}"#);
        assert_eq!(stream.next().await, None);
        assert_eq!(stream.finished().await, SessionState::Cancelled);
        assert!(sender.is_released());
        assert_eq!(transport.release_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_cancels_session() {
        let transport = Arc::new(MockHttpTransport::new());
        let sender = transport.enqueue_streaming_channel();
        let client = ChatClient::with_transport(ChatConfig::default(), transport.clone());

        let stream = client.stream_message("hello").unwrap();
        let cancel = stream.cancellation_token();
        let mut state = stream.state_receiver();
        drop(stream);

        assert!(cancel.is_cancelled());
        assert_eq!(wait_terminal(&mut state).await, SessionState::Cancelled);
        assert_eq!(transport.opened_count(), transport.release_count());
        sender.finish();
    }
}
