//! Client entry points: the chat client, its event stream, and conversations.

mod client;
mod conversation;
mod stream;

pub use client::ChatClient;
pub use conversation::Conversation;
pub use stream::ChatStream;
