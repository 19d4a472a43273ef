//! Conversational orchestration over a chat transport, tools and history.
//!
//! [`ChatOrchestrator`] is the entry point: it prepares each request
//! (history, system prompt, tool schema), dispatches it with recovery for
//! known provider failures, runs requested tools and loops until the model
//! answers without tool calls.
//!
//! ```rust
//! use pchat::{ChatPolicy, OrchestrationParams};
//!
//! let policy = ChatPolicy::default().with_max_tool_rounds(4);
//! let params = OrchestrationParams::prompt("What changed?").include_history(20);
//!
//! assert_eq!(policy.max_tool_rounds, 4);
//! assert_eq!(params.include_history, Some(20));
//! ```

mod error;
mod orchestrator;
mod params;
mod policy;
mod prepare;
mod recovery;
mod stream;
mod tokens;

pub mod prelude {
    pub use crate::{
        AssistantTurn, ChatError, ChatErrorKind, ChatOrchestrator, ChatOrchestratorBuilder,
        ChatPolicy, HeuristicTokenCounter, OrchestrationParams, TokenCounter,
    };
    pub use pcommon::{CancellationFlag, SessionId, TextSink, TraceId, text_sink};
    pub use phistory::HistoryManager;
    pub use ptooling::{FunctionTool, Tool, ToolContext, ToolError, ToolRegistry};
}

pub use error::{ChatError, ChatErrorKind};
pub use orchestrator::{ChatOrchestrator, ChatOrchestratorBuilder};
pub use params::{DEFAULT_TEMPERATURE, OrchestrationParams};
pub use policy::{
    ChatPolicy, DEFAULT_MAX_INPUT_TOKENS, DEFAULT_MAX_RECOVERY_ATTEMPTS, DEFAULT_MAX_TOOL_ROUNDS,
};
pub use prepare::{PreparedRequest, fit_history, insert_system_prompt};
pub use recovery::{
    RecoveryAction, RecoveryState, plan_recovery, reduce_messages, strip_tool_messages,
};
pub use stream::{AssistantTurn, StreamAccumulator};
pub use tokens::{HeuristicTokenCounter, TokenCounter};
