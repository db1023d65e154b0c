//! Integration tests for streaming session lifecycle through the public client.

use bytes::Bytes;
use futures::StreamExt;
use integrations_chat_stream::mocks::MockHttpTransport;
use integrations_chat_stream::{
    ChatClient, ChatConfig, ChatError, ChatEvent, Conversation, NetworkError, SessionState,
    TransportError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Helper to create a client over a mock transport.
fn create_test_client(transport: Arc<MockHttpTransport>) -> ChatClient {
    ChatClient::with_transport(ChatConfig::default(), transport)
}

#[tokio::test]
async fn test_server_error_yields_single_stream_error() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_status(500, r#"{"error":"model crashed"}"#);
    let client = create_test_client(transport.clone());

    let mut stream = client.stream_message("hello").unwrap();
    let events: Vec<_> = stream.by_ref().collect().await;

    assert_eq!(events.len(), 1);
    let ChatEvent::StreamError(error) = &events[0] else {
        panic!("expected stream error, got {:?}", events[0]);
    };
    assert_eq!(error.status(), Some(500));
    assert!(error.to_string().contains("500"));
    assert!(error.to_string().contains("model crashed"));
    assert_eq!(stream.finished().await, SessionState::Failed);
    assert_eq!(transport.opened_count(), 0);
}

#[tokio::test]
async fn test_network_failure_mid_stream() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_results(vec![
        Ok(Bytes::from_static(br#"{"content":"partial"}{"content":"cut"#)),
        Err(TransportError::Request("connection reset".to_string())),
    ]);
    let client = create_test_client(transport.clone());

    let events: Vec<_> = client.stream_message("hello").unwrap().collect().await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ChatEvent::Content("partial".to_string()));
    assert!(matches!(
        &events[1],
        ChatEvent::StreamError(ChatError::Network(NetworkError::StreamInterrupted { .. }))
    ));
    assert_eq!(transport.release_count(), 1);
}

#[tokio::test]
async fn test_trailing_partial_frame_then_complete() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_text(&[r#"{"content": "A""#]);
    let client = create_test_client(transport);

    let events: Vec<_> = client.stream_message("hello").unwrap().collect().await;

    assert_eq!(events, vec![ChatEvent::StreamComplete]);
}

#[tokio::test]
async fn test_non_event_stream_content_type_is_parsed() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_with_content_type(
        vec![Bytes::from_static(br#"{"content":"plain"}"#)],
        Some("application/json"),
    );
    let client = create_test_client(transport);

    let reply = client.stream_message("hello").unwrap().collect_reply().await.unwrap();

    assert_eq!(reply.content, "plain");
    assert!(reply.complete);
}

#[tokio::test]
async fn test_cancel_mid_stream_stops_events_and_releases_once() {
    let transport = Arc::new(MockHttpTransport::new());
    let sender = transport.enqueue_streaming_channel();
    let client = create_test_client(transport.clone());

    let mut stream = client.stream_message("hello").unwrap();
    sender.send_text(r#"{"content":"one"}"#);
    assert_eq!(stream.next().await, Some(ChatEvent::Content("one".to_string())));

    stream.cancel();
    stream.cancel();
    assert_eq!(stream.finished().await, SessionState::Cancelled);
    assert!(!sender.send_text(r#"{"content":"two"}"#));
    assert_eq!(stream.next().await, None);
    assert_eq!(transport.opened_count(), 1);
    assert_eq!(transport.release_count(), 1);
}

#[tokio::test]
async fn test_cancel_from_consumer_suppresses_rest_of_chunk() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_text(&[r#"{"content":"a"}{"content":"b"}{"content":"c"}"#]);
    let client = create_test_client(transport.clone());

    let cancel = CancellationToken::new();
    let session = client
        .stream_session("hello")
        .unwrap()
        .with_cancellation_token(cancel.clone());

    let mut events = Vec::new();
    let state = session
        .run(|event| {
            events.push(event);
            cancel.cancel();
        })
        .await;

    assert_eq!(state, SessionState::Cancelled);
    assert_eq!(events, vec![ChatEvent::Content("a".to_string())]);
    assert_eq!(transport.release_count(), 1);
}

#[tokio::test]
async fn test_cancel_while_connecting() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_pending();
    let client = create_test_client(transport.clone());

    let mut stream = client.stream_message("hello").unwrap();
    tokio::task::yield_now().await;
    stream.cancel();

    assert_eq!(stream.finished().await, SessionState::Cancelled);
    assert_eq!(stream.next().await, None);
    assert_eq!(transport.opened_count(), 0);
}

#[tokio::test]
async fn test_streaming_request_shape() {
    let transport = Arc::new(MockHttpTransport::new());
    transport.enqueue_streaming_text(&[]);
    let client = create_test_client(transport.clone());

    let events: Vec<_> = client.stream_message("  hi there ").unwrap().collect().await;
    assert_eq!(events, vec![ChatEvent::StreamComplete]);

    transport.verify_request_count(1);
    let request = transport.last_request().unwrap();
    assert!(request.url.ends_with("/api/chat/streaming"));
    assert_eq!(request.headers.get("accept").map(String::as_str), Some("text/event-stream"));
    assert_eq!(request.body.as_deref(), Some(br#"{"message":"hi there"}"#.as_slice()));
    assert_eq!(request.timeout, None);
}

#[tokio::test]
async fn test_conversation_supersedes_previous_stream() {
    let transport = Arc::new(MockHttpTransport::new());
    let first_sender = transport.enqueue_streaming_channel();
    transport.enqueue_streaming_text(&[r#"{"reasoningContent":"hmm"}{"content":"new answer"}"#]);
    let mut conversation = Conversation::new(create_test_client(transport.clone()));

    let mut first = conversation.send_streaming("first question").await.unwrap();
    first_sender.send_text(r#"{"content":"old"}"#);
    assert_eq!(first.next().await, Some(ChatEvent::Content("old".to_string())));

    let second = conversation.send_streaming("second question").await.unwrap();
    assert!(first_sender.is_released());
    assert_eq!(first.next().await, None);

    let reply = second.collect_reply().await.unwrap();
    assert_eq!(reply.reasoning, "hmm");
    assert_eq!(reply.content, "new answer");
    assert_eq!(conversation.active_state(), Some(SessionState::Completed));
    assert_eq!(transport.release_count(), 2);
}
