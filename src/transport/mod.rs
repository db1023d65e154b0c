//! HTTP transport layer for the chat stream client.

mod http;
mod error;
mod reqwest;
pub mod endpoints;
mod request;
mod response;

pub use http::{HttpTransport, HttpMethod, HttpRequest, HttpResponse, StreamingResponse, ChunkedStream};
pub use error::TransportError;
pub use reqwest::ReqwestTransport;
pub use request::RequestBuilder;
pub use response::ResponseParser;
