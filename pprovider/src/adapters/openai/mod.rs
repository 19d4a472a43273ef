//! OpenAI-compatible chat completion transport.
//!
//! Any endpoint that speaks the `/chat/completions` protocol works here; the
//! configured `base_url` decides where requests go.

mod serde_api;
mod tests;
mod transport;

pub use transport::{DEFAULT_BASE_URL, OpenAiChatTransport};
