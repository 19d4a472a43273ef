//! Tracing-based observability hooks for provider dispatch and tool execution.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use ptooling::ToolRuntimeHooks;
//!
//! fn accepts_tool_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_tool_hooks(&hooks);
//! ```

use std::time::Duration;

use pprovider::{ProviderError, ProviderOperationHooks, ToolCallRef};
use ptooling::{ToolContext, ToolError, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

fn session_id(context: Option<&ToolContext>) -> Option<&str> {
    context.map(|context| context.session_id.as_str())
}

fn trace_id(context: Option<&ToolContext>) -> Option<&str> {
    context
        .and_then(|context| context.trace_id.as_ref())
        .map(|id| id.as_str())
}

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: &str, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: &str, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider,
            operation,
            attempts
        );
    }

    fn on_failure(&self, provider: &str, operation: &str, attempts: u32, error: &ProviderError) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            status = ?error.status,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &ToolCallRef, context: Option<&ToolContext>) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = session_id(context),
            trace_id = trace_id(context)
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCallRef,
        context: Option<&ToolContext>,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = session_id(context),
            trace_id = trace_id(context),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCallRef,
        context: Option<&ToolContext>,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = session_id(context),
            trace_id = trace_id(context),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_execution_skipped(&self, tool_call: &ToolCallRef, context: Option<&ToolContext>) {
        tracing::warn!(
            phase = "tool",
            event = "execution_skipped",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            session_id = session_id(context),
            trace_id = trace_id(context)
        );
    }
}
