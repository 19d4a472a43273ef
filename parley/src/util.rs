//! Small convenience constructors for common types.

use crate::{Message, OrchestrationParams, ToolContext};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content.into())
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content.into())
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::assistant(content.into())
}

pub fn tool_message(
    tool_call_id: impl Into<String>,
    name: impl Into<String>,
    content: impl Into<String>,
) -> Message {
    Message::tool_result(tool_call_id, name, content.into())
}

pub fn prompt(text: impl Into<String>) -> OrchestrationParams {
    OrchestrationParams::prompt(text)
}

pub fn streaming_prompt(text: impl Into<String>) -> OrchestrationParams {
    OrchestrationParams::prompt(text).enable_streaming()
}

/// A prompt that replays up to `history` recent entries and carries `context`
/// into stateful tools.
pub fn session_prompt(
    text: impl Into<String>,
    history: usize,
    context: ToolContext,
) -> OrchestrationParams {
    OrchestrationParams::prompt(text)
        .include_history(history)
        .with_context(context)
}

#[cfg(test)]
mod tests {
    use crate::{Role, ToolContext};

    use super::{session_prompt, streaming_prompt, tool_message, user_message};

    #[test]
    fn message_helpers_apply_expected_roles() {
        assert_eq!(user_message("hello").role, Role::User);

        let result = tool_message("call-1", "search", "found");
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.name.as_deref(), Some("search"));
        assert_eq!(result.text(), Some("found"));
    }

    #[test]
    fn prompt_helpers_apply_expected_defaults() {
        assert!(streaming_prompt("hello").stream);

        let params = session_prompt("hello", 12, ToolContext::new("session-1"));
        assert!(!params.stream);
        assert_eq!(params.include_history, Some(12));
        assert_eq!(
            params.context.map(|context| context.session_id.as_str().to_string()),
            Some("session-1".to_string())
        );
    }
}
