//! Chat client implementation.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use crate::config::ChatConfig;
use crate::error::{ChatResult, RequestError};
use crate::streaming::{SessionState, StreamSession};
use crate::transport::{
    endpoints, HttpMethod, HttpTransport, RequestBuilder, ReqwestTransport, ResponseParser,
};
use crate::types::{ChatRequest, ChatResponse};
use super::stream::ChatStream;

/// Client for the chat backend.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ChatClient {
    config: Arc<ChatConfig>,
    transport: Arc<dyn HttpTransport>,
    request_builder: RequestBuilder,
}

impl ChatClient {
    /// Create a client backed by a reqwest transport.
    pub fn new(config: ChatConfig) -> ChatResult<Self> {
        let transport = ReqwestTransport::new(config.connect_timeout, &config.user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client from environment variables.
    pub fn from_env() -> ChatResult<Self> {
        Self::new(ChatConfig::from_env()?)
    }

    /// Create a client with a custom transport.
    pub fn with_transport(config: ChatConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let request_builder = RequestBuilder::new(config.base_url.clone());
        Self {
            config: Arc::new(config),
            transport,
            request_builder,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Send a message and wait for the whole reply (`POST /api/chat`).
    pub async fn send_message(&self, message: &str) -> ChatResult<ChatResponse> {
        let body = ChatRequest::new(validate_message(message)?);
        let request = self
            .request_builder
            .clone()
            .with_timeout(self.config.timeout)
            .build_request(HttpMethod::Post, endpoints::CHAT, Some(&body), None)?;

        let span = tracing::info_span!("chat.send", message_len = body.message.len());
        async move {
            let response = self.transport.send(request).await?;
            tracing::debug!(status = response.status, body_len = response.body.len(), "Chat response received");
            ResponseParser::parse_response(response)
        }
        .instrument(span)
        .await
    }

    /// Prepare a streaming session for a message without starting it.
    ///
    /// The returned session is driven with [`StreamSession::run`].
    pub fn stream_session(&self, message: &str) -> ChatResult<StreamSession> {
        let body = ChatRequest::new(validate_message(message)?);
        let request = self.request_builder.build_request(
            HttpMethod::Post,
            endpoints::CHAT_STREAMING,
            Some(&body),
            Some(vec![(
                "accept".to_string(),
                endpoints::EVENT_STREAM_CONTENT_TYPE.to_string(),
            )]),
        )?;

        Ok(StreamSession::new(
            Arc::clone(&self.transport),
            request,
            self.config.streaming,
        ))
    }

    /// Start a streaming session on the current tokio runtime.
    ///
    /// Events arrive through the returned [`ChatStream`]; dropping it cancels
    /// the session.
    pub fn stream_message(&self, message: &str) -> ChatResult<ChatStream> {
        let session = self.stream_session(message)?;
        let session_id = session.id();
        let cancel = session.cancellation_token();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Active);

        tracing::debug!(%session_id, "Spawning streaming session");
        tokio::spawn(session.with_state_observer(state_tx).run(move |event| {
            // The consumer may have gone away; the session notices through cancellation.
            let _ = events_tx.send(event);
        }));

        Ok(ChatStream::new(session_id, events_rx, cancel, state_rx))
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Trim the message and reject it if nothing is left.
pub(crate) fn validate_message(message: &str) -> ChatResult<&str> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(RequestError::EmptyMessage.into());
    }
    Ok(trimmed)
}
