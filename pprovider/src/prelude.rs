//! Common `pprovider` imports for downstream crates.

pub use crate::{
    BoxedChunkStream, ChatRequest, ChatResponse, ChatTransport, ConfigAdapter, ErrorDetail,
    FinishReason, Message, MessageContent, NoopOperationHooks, ProviderConfig, ProviderError,
    ProviderErrorKind, ProviderFuture, ProviderOperationHooks, ReasoningEffort, RequestParameter,
    RetryPolicy, Role, StreamChunk, TokenUsage, ToolCallDelta, ToolCallRef, ToolChoice,
    ToolDefinition, classify_error, execute_with_retry,
};
pub use pcommon::{BoxFuture, MetadataMap};
