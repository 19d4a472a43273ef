//! Capability layer for describing, registering and executing tools.
//!
//! Tools implement [`Tool`] (or are built from closures with
//! [`FunctionTool`]) and are collected in a [`ToolRegistry`]. A conversation
//! hands its tool set to [`ToolExecutionManager::discover`] and then runs
//! each model-issued call through [`ToolExecutionManager::execute`].

mod args;
mod context;
mod error;
mod hooks;
mod manager;
mod registry;
mod schema;
mod tool;

pub mod prelude {
    pub use crate::{
        FunctionTool, ParameterSchema, Tool, ToolBinding, ToolContext, ToolError, ToolErrorKind,
        ToolExecutionManager, ToolFuture, ToolMapping, ToolRegistry, ToolRuntimeHooks,
    };
}

pub use args::{optional_bool, optional_string, parse_arguments, required_i64, required_string};
pub use context::ToolContext;
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use manager::{ToolBinding, ToolExecutionManager, ToolMapping};
pub use registry::ToolRegistry;
pub use schema::ParameterSchema;
pub use tool::{FunctionTool, Tool, ToolFuture};
