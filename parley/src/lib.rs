//! Unified facade over the parley workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core parley crates, wires them into a [`ParleyRuntime`]
//! and offers a [`CompletionClient`] plus macros for building messages.
//!
//! ```rust
//! use parley::{OrchestrationParams, Role, parley_messages};
//!
//! let params = OrchestrationParams::messages(parley_messages![
//!     system => "You are concise.",
//!     user => "What changed since yesterday?",
//! ])
//! .include_history(20);
//!
//! assert_eq!(params.messages[0].role, Role::System);
//! ```

mod client;
mod macros;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use pchat;
pub use pcommon;
pub use phistory;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    AssistantTurn, ChatError, ChatErrorKind, ChatOrchestrator, ChatOrchestratorBuilder,
    ChatPolicy, DEFAULT_TEMPERATURE, HeuristicTokenCounter, OrchestrationParams, TokenCounter,
};
pub use pcommon::{
    BoxFuture, CancellationFlag, MetadataMap, SessionId, TextSink, TraceId, text_sink,
};
pub use phistory::{
    HistoryEntry, HistoryError, HistoryErrorKind, HistoryManager, HistoryStore,
    HistoryStoreConfig, default_history_path,
};
pub use pobserve::{
    MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks,
};
pub use pprovider::{
    ChatRequest, ChatResponse, ChatTransport, ConfigAdapter, ConfigError, ConfigSource,
    ConfigValue, FinishReason, MapConfigSource, Message, MessageContent, NoopOperationHooks,
    ProviderConfig, ProviderError, ProviderErrorKind, ProviderOperationHooks, ReasoningEffort,
    RetryPolicy, Role, StreamChunk, TomlConfigSource, ToolCallRef, ToolDefinition,
};
pub use ptooling::{
    FunctionTool, NoopToolRuntimeHooks, ParameterSchema, Tool, ToolContext, ToolError,
    ToolErrorKind, ToolExecutionManager, ToolRegistry, ToolRuntimeHooks, optional_bool,
    optional_string, required_i64, required_string,
};

pub use client::{CompletionClient, CompletionOptions};
pub use runtime::{Observability, ParleyRuntime, RuntimeError, RuntimeErrorKind, RuntimeOptions};
pub use util::{
    assistant_message, prompt, session_prompt, streaming_prompt, system_message, tool_message,
    user_message,
};
