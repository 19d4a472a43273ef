//! Tool discovery and guarded execution for one conversation.
//!
//! [`ToolExecutionManager::discover`] turns a tool set into provider-facing
//! definitions plus a name-keyed [`ToolMapping`]. [`ToolExecutionManager::execute`]
//! runs one call and always produces a tool result message: failures,
//! panics and timeouts become result text so the conversation can continue.
//!
//! The manager remembers the previous call. An identical follow-up call
//! (same tool, same argument text, same assistant content) is not run
//! again; a "skipped" result is returned instead.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pprovider::{ToolCallRef, ToolDefinition};
//! use ptooling::{FunctionTool, Tool, ToolExecutionManager};
//! use serde_json::json;
//!
//! # block_on_ready(async {
//! let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(FunctionTool::new(
//!     ToolDefinition {
//!         name: "add".to_string(),
//!         description: "Adds two numbers".to_string(),
//!         parameters: json!({"type": "object"}),
//!     },
//!     |args, _ctx| async move {
//!         let a = args["a"].as_i64().unwrap_or_default();
//!         let b = args["b"].as_i64().unwrap_or_default();
//!         Ok(json!(a + b))
//!     },
//! ))];
//!
//! let (definitions, mapping) = ToolExecutionManager::discover(&tools);
//! assert_eq!(definitions.len(), 1);
//!
//! let manager = ToolExecutionManager::new();
//! let call = ToolCallRef::function("call_1", "add", r#"{"a":2,"b":3}"#);
//! let binding = mapping.get("add").expect("add is mapped");
//! let (_record, result) = manager.execute(binding, "", &call, None).await;
//! assert_eq!(result.content_text(), "5");
//! # });
//! # fn block_on_ready<F: std::future::Future>(future: F) -> F::Output {
//! #     futures_util::FutureExt::now_or_never(Box::pin(future)).expect("future should be ready")
//! # }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::FutureExt;
use futures_util::future::{Either, select};
use pcommon::{Registry, TextSink};
use pprovider::{Message, MessageContent, ToolCallRef, ToolDefinition};
use serde_json::Value;

use crate::{
    NoopToolRuntimeHooks, Tool, ToolContext, ToolError, ToolRuntimeHooks, parse_arguments,
};

/// A discovered tool plus whether it receives the caller's context.
#[derive(Clone)]
pub struct ToolBinding {
    pub tool: Arc<dyn Tool>,
    pub stateless: bool,
}

impl ToolBinding {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        let stateless = tool.is_stateless();
        Self { tool, stateless }
    }
}

impl std::fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBinding")
            .field("name", &self.tool.definition().name)
            .field("stateless", &self.stateless)
            .finish()
    }
}

/// Name-keyed bindings, rebuilt for every invocation and never persisted.
#[derive(Debug, Clone, Default)]
pub struct ToolMapping {
    bindings: Registry<String, ToolBinding>,
}

impl ToolMapping {
    pub fn get(&self, name: &str) -> Option<&ToolBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CallSignature {
    name: String,
    arguments: String,
    assistant_content: String,
}

#[derive(Clone)]
pub struct ToolExecutionManager {
    last_signature: Arc<Mutex<Option<CallSignature>>>,
    progress: Option<TextSink>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl Default for ToolExecutionManager {
    fn default() -> Self {
        Self {
            last_signature: Arc::new(Mutex::new(None)),
            progress: None,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }
}

impl ToolExecutionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Slow tools resolve to a timeout result after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a manager that reports progress to `sink` and shares this
    /// manager's anti-loop memory.
    pub fn with_progress_sink(&self, sink: TextSink) -> Self {
        Self {
            progress: Some(sink),
            ..self.clone()
        }
    }

    /// Forgets the previous call so the next one always runs.
    pub fn reset(&self) {
        *self
            .last_signature
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn discover(tools: &[Arc<dyn Tool>]) -> (Vec<ToolDefinition>, ToolMapping) {
        let mut definitions: Vec<ToolDefinition> = Vec::with_capacity(tools.len());
        let mut mapping = ToolMapping::default();

        for tool in tools {
            let definition = tool.definition();
            let name = definition.name.clone();

            if mapping.contains(&name) {
                tracing::warn!(
                    phase = "tool",
                    event = "duplicate_definition",
                    tool_name = %name,
                    "duplicate tool name, keeping the last definition"
                );
                definitions.retain(|existing| existing.name != name);
            }

            definitions.push(definition);
            mapping
                .bindings
                .insert(name, ToolBinding::new(Arc::clone(tool)));
        }

        (definitions, mapping)
    }

    /// Runs one tool call, returning the call record and its result message.
    pub async fn execute(
        &self,
        binding: &ToolBinding,
        assistant_content: &str,
        call: &ToolCallRef,
        context: Option<&ToolContext>,
    ) -> (ToolCallRef, Message) {
        let signature = CallSignature {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            assistant_content: assistant_content.to_string(),
        };

        if self.is_repeat(&signature) {
            tracing::warn!(
                phase = "tool",
                event = "skipped_repeat",
                tool_name = %call.name,
                call_id = %call.id,
                "skipping repeated tool call"
            );
            self.hooks.on_execution_skipped(call, context);
            self.report(&format!("Skipping repeated tool call: {}\n", call.name));
            let message = Message::tool_result(
                call.id.clone(),
                call.name.clone(),
                format!("Skipped repeated tool call: {}", call.name),
            );
            return (call.clone(), message);
        }

        self.hooks.on_execution_start(call, context);
        tracing::debug!(
            phase = "tool",
            event = "start",
            tool_name = %call.name,
            call_id = %call.id,
            stateless = binding.stateless,
            "executing tool"
        );

        let started = Instant::now();
        let injected = if binding.stateless { None } else { context };
        let outcome = self.run(binding, &call.arguments, injected).await;
        let elapsed = started.elapsed();

        let content = match outcome {
            Ok(value) => {
                self.hooks.on_execution_success(call, context, elapsed);
                result_content(value)
            }
            Err(error) => {
                let error = error
                    .with_tool_name(call.name.clone())
                    .with_tool_call_id(call.id.clone());
                tracing::warn!(
                    phase = "tool",
                    event = "failed",
                    tool_name = %call.name,
                    call_id = %call.id,
                    error_kind = ?error.kind,
                    error = %error.message,
                    "tool execution failed"
                );
                self.hooks
                    .on_execution_failure(call, context, &error, elapsed);
                MessageContent::Text(format!(
                    "Error executing tool {}: {}",
                    call.name, error.message
                ))
            }
        };

        self.report(&format!("Tool {} execution completed.\n", call.name));
        self.remember(signature);

        let message = Message::tool_result(call.id.clone(), call.name.clone(), content);
        (call.clone(), message)
    }

    async fn run(
        &self,
        binding: &ToolBinding,
        arguments: &str,
        context: Option<&ToolContext>,
    ) -> Result<Value, ToolError> {
        let args = parse_arguments(arguments)?;
        let invocation = AssertUnwindSafe(binding.tool.invoke(args, context)).catch_unwind();

        let result = match self.timeout {
            Some(timeout) => match select(Box::pin(invocation), Delay::new(timeout)).await {
                Either::Left((result, _)) => result,
                Either::Right(_) => {
                    return Err(ToolError::timeout(format!(
                        "tool did not finish within {}ms",
                        timeout.as_millis()
                    )));
                }
            },
            None => invocation.await,
        };

        result.unwrap_or_else(|panic| Err(ToolError::panicked(panic_message(panic.as_ref()))))
    }

    fn is_repeat(&self, signature: &CallSignature) -> bool {
        self.last_signature
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            == Some(signature)
    }

    fn remember(&self, signature: CallSignature) {
        *self
            .last_signature
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(signature);
    }

    fn report(&self, text: &str) {
        if let Some(sink) = &self.progress {
            sink(text);
        }
    }
}

/// Lists stay structured; strings pass through; anything else becomes JSON text.
fn result_content(value: Value) -> MessageContent {
    match value {
        Value::Array(items) => MessageContent::Parts(items),
        Value::String(text) => MessageContent::Text(text),
        other => MessageContent::Text(other.to_string()),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("tool panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("tool panicked: {message}")
    } else {
        "tool panicked".to_string()
    }
}
