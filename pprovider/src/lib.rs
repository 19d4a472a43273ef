//! Provider-facing types and transports for the parley runtime.
//!
//! This crate owns the normalized chat model ([`ChatRequest`], [`Message`],
//! [`ChatResponse`], [`StreamChunk`]), the structured error taxonomy
//! ([`ProviderError`] and [`classify_error`]), provider configuration
//! ([`ConfigAdapter`]) and the [`ChatTransport`] seam that concrete adapters
//! implement.
//!
//! ```rust
//! use pprovider::{ChatRequest, Message};
//!
//! let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hello")])
//!     .with_temperature(0.1);
//!
//! assert!(request.validate().is_ok());
//! ```

pub mod adapters;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod error;
pub mod model;
pub mod prelude;
pub mod resilience;
pub mod stream;
pub mod transport;

pub use classify::classify_error;
pub use config::{
    CONFIG_PATH_ENV, ConfigAdapter, ConfigError, ConfigErrorKind, ConfigSource, ConfigValue,
    DEFAULT_APPLICATION_NAME, DEFAULT_MAX_COMPLETION_TOKENS, DEFAULT_PROVIDER_KEY,
    DEFAULT_PROVIDER_NAME, MapConfigSource, ProviderConfig, TimeoutConfig, TokenParameter,
    TomlConfigSource, default_config_path,
};
pub use credentials::{CredentialKind, ProviderCredential, SecretString};
pub use error::{ErrorDetail, ProviderError, ProviderErrorKind};
pub use model::{
    ChatRequest, ChatResponse, FinishReason, Message, MessageContent, ReasoningEffort,
    RequestParameter, Role, StreamChunk, TokenUsage, ToolCallDelta, ToolCallRef, ToolChoice,
    ToolDefinition,
};
pub use resilience::{NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry};
pub use stream::{BoxedChunkStream, ChunkStream, VecChunkStream};
pub use transport::{ChatTransport, ProviderFuture};

#[cfg(feature = "provider-openai")]
pub use adapters::openai::OpenAiChatTransport;
