//! One logical chat with at most one live streaming session.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::ChatResult;
use crate::streaming::SessionState;
use crate::types::ChatResponse;
use super::client::{validate_message, ChatClient};
use super::stream::{wait_terminal, ChatStream};

struct ActiveSession {
    cancel: CancellationToken,
    state: watch::Receiver<SessionState>,
}

/// A chat in which each new streaming request supersedes the previous one.
///
/// Before a new streaming request is sent, the previous session is cancelled
/// and its transport body released, so at most one body is read per
/// conversation at any time.
pub struct Conversation {
    client: ChatClient,
    active: Option<ActiveSession>,
}

impl Conversation {
    /// Start a conversation on the given client.
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            active: None,
        }
    }

    /// Stream a reply to `message`, superseding any session still running.
    ///
    /// An empty message is rejected without touching the running session.
    pub async fn send_streaming(&mut self, message: &str) -> ChatResult<ChatStream> {
        validate_message(message)?;

        if let Some(previous) = self.cancel().await {
            tracing::debug!(previous = %previous, "Superseded previous streaming session");
        }

        let stream = self.client.stream_message(message)?;
        self.active = Some(ActiveSession {
            cancel: stream.cancellation_token(),
            state: stream.state_receiver(),
        });
        Ok(stream)
    }

    /// Send a message without streaming.
    pub async fn send(&self, message: &str) -> ChatResult<ChatResponse> {
        self.client.send_message(message).await
    }

    /// Cancel the active session and wait until it has released its transport.
    ///
    /// Returns the state the session ended in, or `None` if there was none.
    pub async fn cancel(&mut self) -> Option<SessionState> {
        let mut active = self.active.take()?;
        active.cancel.cancel();
        Some(wait_terminal(&mut active.state).await)
    }

    /// State of the most recent session, if any.
    pub fn active_state(&self) -> Option<SessionState> {
        self.active.as_ref().map(|active| *active.state.borrow())
    }

    /// The underlying client.
    pub fn client(&self) -> &ChatClient {
        &self.client
    }
}
