//! Caller-facing parameters for one orchestrated chat run.

use std::sync::Arc;

use pcommon::CancellationFlag;
use pprovider::{Message, ReasoningEffort};
use ptooling::{Tool, ToolContext};

pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Input for [`ChatOrchestrator::invoke`](crate::ChatOrchestrator::invoke).
///
/// Either `messages` or `prompt` must be supplied; a bare prompt becomes a
/// single user message.
///
/// ```rust
/// use pchat::OrchestrationParams;
///
/// let params = OrchestrationParams::prompt("ping")
///     .with_system_prompt("Answer briefly.")
///     .include_history(10)
///     .enable_streaming();
///
/// assert_eq!(params.prompt.as_deref(), Some("ping"));
/// assert_eq!(params.include_history, Some(10));
/// assert!(params.stream);
/// ```
#[derive(Clone)]
pub struct OrchestrationParams {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub prompt: Option<String>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub temperature: f32,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub system_prompt: Option<String>,
    pub context: Option<ToolContext>,
    pub max_completion_tokens: Option<u32>,
    pub include_history: Option<usize>,
    pub stream: bool,
    pub cancellation: Option<CancellationFlag>,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            model: None,
            messages: Vec::new(),
            prompt: None,
            tools: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            reasoning_effort: None,
            system_prompt: None,
            context: None,
            max_completion_tokens: None,
            include_history: None,
            stream: false,
            cancellation: None,
        }
    }
}

impl OrchestrationParams {
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_context(mut self, context: ToolContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_completion_tokens);
        self
    }

    pub fn include_history(mut self, entries: usize) -> Self {
        self.include_history = Some(entries);
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }

    /// Same parameters with `messages` replacing the conversation input.
    pub(crate) fn follow_up(&self, messages: Vec<Message>) -> Self {
        Self {
            messages,
            prompt: None,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for OrchestrationParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tool_names = self
            .tools
            .iter()
            .map(|tool| tool.definition().name)
            .collect::<Vec<_>>();

        f.debug_struct("OrchestrationParams")
            .field("model", &self.model)
            .field("messages", &self.messages.len())
            .field("prompt", &self.prompt)
            .field("tools", &tool_names)
            .field("temperature", &self.temperature)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("system_prompt", &self.system_prompt)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("include_history", &self.include_history)
            .field("stream", &self.stream)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_replaces_input_and_keeps_everything_else() {
        let flag = CancellationFlag::new();
        let params = OrchestrationParams::prompt("ping")
            .with_model("gpt-4o")
            .with_temperature(0.4)
            .with_max_completion_tokens(256)
            .include_history(4)
            .with_cancellation(flag.clone());

        let follow_up = params.follow_up(vec![Message::assistant("calling")]);

        assert!(follow_up.prompt.is_none());
        assert_eq!(follow_up.messages, vec![Message::assistant("calling")]);
        assert_eq!(follow_up.model.as_deref(), Some("gpt-4o"));
        assert_eq!(follow_up.temperature, 0.4);
        assert_eq!(follow_up.max_completion_tokens, Some(256));
        assert_eq!(follow_up.include_history, Some(4));

        flag.cancel();
        assert!(follow_up.is_cancelled());
    }
}
