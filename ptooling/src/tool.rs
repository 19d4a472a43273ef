//! Tool descriptor contract and the closure-backed implementation.
//!
//! A tool describes itself once, through [`Tool::definition`], and is
//! invoked with already-parsed JSON arguments.
//!
//! ```rust
//! use pprovider::ToolDefinition;
//! use ptooling::{FunctionTool, ParameterSchema, Tool};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition {
//!         name: "echo".to_string(),
//!         description: "Echoes input".to_string(),
//!         parameters: ParameterSchema::new().string("text", "Text to echo").build(),
//!     },
//!     |args, _context| async move { Ok(json!(args)) },
//! );
//!
//! assert_eq!(tool.definition().name, "echo");
//! assert!(tool.is_stateless());
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::BoxFuture;
use pprovider::ToolDefinition;
use serde_json::{Map, Value};

use crate::{ToolContext, ToolError};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Stateless tools never receive a [`ToolContext`].
    fn is_stateless(&self) -> bool {
        true
    }

    fn invoke<'a>(
        &'a self,
        args: Map<String, Value>,
        context: Option<&'a ToolContext>,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

type ToolHandler = dyn Fn(Map<String, Value>, Option<ToolContext>) -> ToolFuture<'static, Result<Value, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
    stateless: bool,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Map<String, Value>, Option<ToolContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |args, context| Box::pin(handler(args, context)));

        Self {
            definition,
            handler,
            stateless: true,
        }
    }

    /// Marks the tool as needing the caller's context on every call.
    pub fn stateful(mut self) -> Self {
        self.stateless = false;
        self
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.definition.name)
            .field("stateless", &self.stateless)
            .finish_non_exhaustive()
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn is_stateless(&self) -> bool {
        self.stateless
    }

    fn invoke<'a>(
        &'a self,
        args: Map<String, Value>,
        context: Option<&'a ToolContext>,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        (self.handler)(args, context.cloned())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            parameters: json!({"type": "object"}),
        }
    }

    #[tokio::test]
    async fn function_tool_passes_context_through() {
        let tool = FunctionTool::new(definition("whoami"), |_args, context| async move {
            let session = context
                .map(|context| context.session_id.to_string())
                .unwrap_or_default();
            Ok(json!({"session": session}))
        })
        .stateful();

        assert!(!tool.is_stateless());
        let context = ToolContext::new("session-4");
        let output = tool
            .invoke(Map::new(), Some(&context))
            .await
            .expect("tool should succeed");
        assert_eq!(output, json!({"session": "session-4"}));
    }

    #[tokio::test]
    async fn function_tool_surfaces_handler_errors() {
        let tool = FunctionTool::new(definition("broken"), |_args, _context| async move {
            Err(ToolError::execution("tool exploded"))
        });

        let error = tool
            .invoke(Map::new(), None)
            .await
            .expect_err("tool should fail");
        assert_eq!(error.message, "tool exploded");
        assert!(format!("{tool:?}").contains("broken"));
    }
}
