//! Common imports for most parley applications.

pub use crate::{
    CancellationFlag, ChatError, ChatErrorKind, ChatOrchestrator, ChatPolicy, CompletionClient,
    CompletionOptions, FunctionTool, HistoryManager, HistoryStoreConfig, MapConfigSource, Message,
    Observability, OrchestrationParams, ParameterSchema, ParleyRuntime, ProviderConfig,
    ProviderError, Role, RuntimeError, RuntimeOptions, SessionId, TextSink, Tool, ToolContext,
    ToolError, ToolRegistry, TraceId, text_sink,
};
pub use crate::{
    assistant_message, prompt, session_prompt, streaming_prompt, system_message, tool_message,
    user_message,
};
pub use crate::{parley_messages, parley_msg};
