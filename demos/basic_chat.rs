//! Non-streaming chat example.
//!
//! This example demonstrates:
//! - Creating a client from environment variables
//! - Sending a single message and waiting for the full reply
//! - Inspecting API errors
//!
//! # Usage
//!
//! Point the client at a running backend:
//! ```bash
//! export CHAT_BASE_URL="http://localhost:8080"
//! ```
//!
//! Then run:
//! ```bash
//! cargo run --example basic_chat -- "What is a borrow checker?"
//! ```

use integrations_chat_stream::{ChatClient, ChatError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Say hello in three languages.".to_string());

    let client = ChatClient::from_env()?;
    println!("Sending to {}", client.config().base_url);

    match client.send_message(&message).await {
        Ok(response) => {
            println!("\n{}", response.content);
            if !response.extra.is_empty() {
                println!("\nExtra fields: {}", serde_json::Value::Object(response.extra));
            }
        }
        Err(error @ ChatError::Request(_)) => {
            eprintln!("Request rejected: {}", error);
            if let Some(delay) = error.retry_after() {
                eprintln!("Retry after {:?}", delay);
            }
        }
        Err(error) => return Err(error.into()),
    }

    Ok(())
}
