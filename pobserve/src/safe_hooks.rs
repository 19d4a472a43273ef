//! Wrappers that keep a panicking hook from unwinding into the runtime.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pprovider::{ProviderError, ProviderOperationHooks, ToolCallRef};
use ptooling::{ToolContext, ToolError, ToolRuntimeHooks};

fn contain(hook: &str, callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::warn!(phase = "hooks", event = "hook_panicked", hook, "observability hook panicked");
    }
}

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: &str, operation: &str, attempt: u32) {
        contain("provider.on_attempt_start", || {
            self.inner.on_attempt_start(provider, operation, attempt)
        });
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        contain("provider.on_retry_scheduled", || {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        });
    }

    fn on_success(&self, provider: &str, operation: &str, attempts: u32) {
        contain("provider.on_success", || {
            self.inner.on_success(provider, operation, attempts)
        });
    }

    fn on_failure(&self, provider: &str, operation: &str, attempts: u32, error: &ProviderError) {
        contain("provider.on_failure", || {
            self.inner.on_failure(provider, operation, attempts, error)
        });
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCallRef, context: Option<&ToolContext>) {
        contain("tool.on_execution_start", || {
            self.inner.on_execution_start(tool_call, context)
        });
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCallRef,
        context: Option<&ToolContext>,
        elapsed: Duration,
    ) {
        contain("tool.on_execution_success", || {
            self.inner.on_execution_success(tool_call, context, elapsed)
        });
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCallRef,
        context: Option<&ToolContext>,
        error: &ToolError,
        elapsed: Duration,
    ) {
        contain("tool.on_execution_failure", || {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        });
    }

    fn on_execution_skipped(&self, tool_call: &ToolCallRef, context: Option<&ToolContext>) {
        contain("tool.on_execution_skipped", || {
            self.inner.on_execution_skipped(tool_call, context)
        });
    }
}
