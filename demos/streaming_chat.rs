//! Streaming chat example.
//!
//! This example demonstrates:
//! - Streaming reasoning and content events as they arrive
//! - Cancelling a session with Ctrl-C
//! - Superseding a running session inside a conversation
//!
//! # Usage
//!
//! ```bash
//! export CHAT_BASE_URL="http://localhost:8080"
//! RUST_LOG=integrations_chat_stream=debug cargo run --example streaming_chat
//! ```

use std::io::Write;

use futures::StreamExt;
use integrations_chat_stream::{ChatClient, ChatEvent, Conversation};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = ChatClient::from_env()?;
    let mut conversation = Conversation::new(client);

    // This request is superseded by the next one before it finishes.
    let _abandoned = conversation
        .send_streaming("Write a very long essay about the history of compilers.")
        .await?;

    let mut stream = conversation
        .send_streaming("In two sentences, what does a tokenizer do?")
        .await?;
    let cancel = stream.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let mut in_reasoning = false;
    while let Some(event) = stream.next().await {
        match event {
            ChatEvent::Reasoning(text) => {
                if !in_reasoning {
                    write!(stdout, "[thinking] ")?;
                    in_reasoning = true;
                }
                write!(stdout, "{}", text)?;
            }
            ChatEvent::Content(text) => {
                if in_reasoning {
                    writeln!(stdout, "\n")?;
                    in_reasoning = false;
                }
                write!(stdout, "{}", text)?;
            }
            ChatEvent::StreamError(error) => {
                eprintln!("\nStream failed: {}", error);
                break;
            }
            ChatEvent::StreamComplete => writeln!(stdout)?,
        }
        stdout.flush()?;
    }

    println!("Session {} ended: {}", stream.session_id(), stream.finished().await);
    Ok(())
}
