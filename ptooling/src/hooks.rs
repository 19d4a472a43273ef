//! Lifecycle hooks for tool execution.
//!
//! ```rust
//! use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use pprovider::ToolCallRef;

use crate::{ToolContext, ToolError};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_execution_start(&self, _tool_call: &ToolCallRef, _context: Option<&ToolContext>) {}

    fn on_execution_success(
        &self,
        _tool_call: &ToolCallRef,
        _context: Option<&ToolContext>,
        _elapsed: Duration,
    ) {
    }

    fn on_execution_failure(
        &self,
        _tool_call: &ToolCallRef,
        _context: Option<&ToolContext>,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }

    /// Called instead of the other hooks when the anti-loop guard fires.
    fn on_execution_skipped(&self, _tool_call: &ToolCallRef, _context: Option<&ToolContext>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
