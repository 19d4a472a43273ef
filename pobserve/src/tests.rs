use std::sync::{Arc, Mutex};
use std::time::Duration;

use pprovider::{ProviderError, ProviderOperationHooks, ToolCallRef, ToolDefinition};
use ptooling::{
    FunctionTool, ToolBinding, ToolContext, ToolError, ToolExecutionManager, ToolRuntimeHooks,
};
use serde_json::json;

use crate::{MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};

fn sample_tool_call() -> ToolCallRef {
    ToolCallRef::function("call-1", "echo", "{}")
}

fn sample_tool_context() -> ToolContext {
    ToolContext::new("session-1").with_trace_id("trace-1")
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;
    let provider_error = ProviderError::timeout("provider timeout");
    let tool_error = ToolError::execution("tool failed");
    let context = sample_tool_context();

    hooks.on_attempt_start("openai", "execute_chat", 1);
    hooks.on_retry_scheduled(
        "openai",
        "execute_chat",
        1,
        Duration::from_millis(10),
        &provider_error,
    );
    hooks.on_success("openai", "execute_chat", 2);
    hooks.on_failure("openai", "execute_chat", 2, &provider_error);

    hooks.on_execution_start(&sample_tool_call(), Some(&context));
    hooks.on_execution_success(&sample_tool_call(), None, Duration::from_millis(20));
    hooks.on_execution_failure(
        &sample_tool_call(),
        Some(&context),
        &tool_error,
        Duration::from_millis(20),
    );
    hooks.on_execution_skipped(&sample_tool_call(), Some(&context));
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;
    let provider_error = ProviderError::rate_limited("slow down");
    let tool_error = ToolError::execution("tool failed");

    hooks.on_attempt_start("openai", "stream_chat", 1);
    hooks.on_retry_scheduled(
        "openai",
        "stream_chat",
        1,
        Duration::from_millis(5),
        &provider_error,
    );
    hooks.on_success("openai", "stream_chat", 2);
    hooks.on_failure("openai", "stream_chat", 3, &provider_error);

    hooks.on_execution_start(&sample_tool_call(), None);
    hooks.on_execution_success(&sample_tool_call(), None, Duration::from_millis(1));
    hooks.on_execution_failure(
        &sample_tool_call(),
        None,
        &tool_error,
        Duration::from_millis(1),
    );
    hooks.on_execution_skipped(&sample_tool_call(), None);
}

#[derive(Default)]
struct RecordingProviderHooks {
    events: Mutex<Vec<String>>,
}

impl ProviderOperationHooks for RecordingProviderHooks {
    fn on_attempt_start(&self, provider: &str, operation: &str, attempt: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{provider}:{operation}:{attempt}"));
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        _operation: &str,
        attempt: u32,
        _delay: Duration,
        error: &ProviderError,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("retry:{provider}:{attempt}:{:?}", error.kind));
    }

    fn on_success(&self, provider: &str, _operation: &str, attempts: u32) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{provider}:{attempts}"));
    }

    fn on_failure(&self, provider: &str, _operation: &str, attempts: u32, _error: &ProviderError) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{provider}:{attempts}"));
    }
}

impl RecordingProviderHooks {
    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

#[derive(Clone, Default)]
struct RecordingToolHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl ToolRuntimeHooks for RecordingToolHooks {
    fn on_execution_start(&self, tool_call: &ToolCallRef, context: Option<&ToolContext>) {
        let session = context.map(|context| context.session_id.as_str().to_string());
        self.events
            .lock()
            .expect("events lock")
            .push(format!("start:{}:{:?}", tool_call.name, session));
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCallRef,
        _context: Option<&ToolContext>,
        _elapsed: Duration,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("success:{}", tool_call.name));
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCallRef,
        _context: Option<&ToolContext>,
        error: &ToolError,
        _elapsed: Duration,
    ) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("failure:{}:{:?}", tool_call.name, error.kind));
    }

    fn on_execution_skipped(&self, tool_call: &ToolCallRef, _context: Option<&ToolContext>) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("skipped:{}", tool_call.name));
    }
}

struct PanicProviderHooks;

impl ProviderOperationHooks for PanicProviderHooks {
    fn on_attempt_start(&self, _provider: &str, _operation: &str, _attempt: u32) {
        panic!("attempt hook exploded");
    }

    fn on_failure(&self, _provider: &str, _operation: &str, _attempts: u32, _error: &ProviderError) {
        panic!("failure hook exploded");
    }
}

struct PanicToolHooks;

impl ToolRuntimeHooks for PanicToolHooks {
    fn on_execution_start(&self, _tool_call: &ToolCallRef, _context: Option<&ToolContext>) {
        panic!("start hook exploded");
    }

    fn on_execution_success(
        &self,
        _tool_call: &ToolCallRef,
        _context: Option<&ToolContext>,
        _elapsed: Duration,
    ) {
        panic!("success hook exploded");
    }
}

#[test]
fn safe_provider_hooks_delegate_to_inner() {
    let safe = SafeProviderHooks::new(RecordingProviderHooks::default());
    let error = ProviderError::rate_limited("slow down");

    safe.on_attempt_start("openai", "execute_chat", 1);
    safe.on_retry_scheduled("openai", "execute_chat", 1, Duration::ZERO, &error);
    safe.on_success("openai", "execute_chat", 2);
    safe.on_failure("openai", "execute_chat", 3, &error);

    assert_eq!(
        safe.inner().events(),
        vec![
            "start:openai:execute_chat:1".to_string(),
            "retry:openai:1:RateLimited".to_string(),
            "success:openai:2".to_string(),
            "failure:openai:3".to_string(),
        ]
    );
}

#[test]
fn safe_provider_hooks_swallow_panics() {
    let safe = SafeProviderHooks::new(PanicProviderHooks);

    safe.on_attempt_start("openai", "execute_chat", 1);
    safe.on_failure(
        "openai",
        "execute_chat",
        1,
        &ProviderError::transport("connection reset"),
    );
}

#[test]
fn safe_tool_hooks_swallow_panics() {
    let safe = SafeToolHooks::new(PanicToolHooks);
    let context = sample_tool_context();

    safe.on_execution_start(&sample_tool_call(), Some(&context));
    safe.on_execution_success(&sample_tool_call(), Some(&context), Duration::ZERO);
    safe.on_execution_skipped(&sample_tool_call(), Some(&context));
}

fn echo_binding() -> ToolBinding {
    ToolBinding::new(Arc::new(FunctionTool::new(
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes its input".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        },
        |_args, _context| async move { Ok(json!("echoed")) },
    )))
}

#[tokio::test]
async fn tool_manager_reports_through_safe_hooks() {
    let recorder = RecordingToolHooks::default();
    let manager =
        ToolExecutionManager::new().with_hooks(Arc::new(SafeToolHooks::new(recorder.clone())));
    let binding = echo_binding();
    let context = sample_tool_context();

    let (_, first) = manager
        .execute(&binding, "", &sample_tool_call(), Some(&context))
        .await;
    let (_, repeat) = manager
        .execute(&binding, "", &sample_tool_call(), Some(&context))
        .await;

    assert_eq!(first.content_text(), "echoed");
    assert!(repeat.content_text().starts_with("Skipped repeated tool call"));
    assert_eq!(
        *recorder.events.lock().expect("events lock"),
        vec![
            "start:echo:Some(\"session-1\")".to_string(),
            "success:echo".to_string(),
            "skipped:echo".to_string(),
        ]
    );
}

#[tokio::test]
async fn panicking_hooks_do_not_break_tool_execution() {
    let manager = ToolExecutionManager::new().with_hooks(Arc::new(SafeToolHooks::new(PanicToolHooks)));

    let (call, message) = manager
        .execute(&echo_binding(), "", &sample_tool_call(), None)
        .await;

    assert_eq!(call.id, "call-1");
    assert_eq!(message.content_text(), "echoed");
}
