//! Error types for the chat stream client.

mod types;
mod categories;
mod mapper;

pub use types::*;
pub use categories::*;
pub use mapper::*;
