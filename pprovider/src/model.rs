//! Provider-agnostic chat message and request model.
//!
//! ```rust
//! use pprovider::{ChatRequest, Message, Role};
//!
//! let request = ChatRequest::new("gpt-4o-mini", vec![
//!     Message::system("Be brief."),
//!     Message::user("ping"),
//! ])
//! .with_temperature(0.1)
//! .with_max_completion_tokens(256);
//!
//! assert!(request.validate().is_ok());
//! assert_eq!(request.messages[0].role, Role::System);
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(ProviderError::invalid_request(format!(
                "unknown message role '{other}'"
            ))),
        }
    }
}

/// Message body: plain text, or structured parts kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

impl MessageContent {
    /// Flattens the content into text, joining the `text` field of parts when present.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    Value::String(text) => text.clone(),
                    Value::Object(fields) => fields
                        .get("text")
                        .or_else(|| fields.get("input_text"))
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                        .unwrap_or_else(|| part.to_string()),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRef {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallRef {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Option<MessageContent>,
    pub tool_calls: Vec<ToolCallRef>,
    pub tool_call_id: Option<String>,
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn assistant_with_tool_calls(
        content: impl Into<MessageContent>,
        tool_calls: Vec<ToolCallRef>,
    ) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<MessageContent>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(MessageContent::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn content_text(&self) -> String {
        self.content
            .as_ref()
            .map(MessageContent::to_text)
            .unwrap_or_default()
    }

    /// True for tool results and assistant messages that carry tool calls.
    pub fn is_tool_shaped(&self) -> bool {
        self.role == Role::Tool || !self.tool_calls.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    Function(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for ReasoningEffort {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ProviderError::invalid_request(format!(
                "unknown reasoning effort '{other}'"
            ))),
        }
    }
}

/// Optional request fields that a provider may reject by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestParameter {
    Temperature,
    MaxCompletionTokens,
    ReasoningEffort,
    Tools,
    ToolChoice,
}

impl RequestParameter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "temperature" => Some(Self::Temperature),
            "max_tokens" | "max_completion_tokens" => Some(Self::MaxCompletionTokens),
            "reasoning_effort" => Some(Self::ReasoningEffort),
            "tools" | "functions" => Some(Self::Tools),
            "tool_choice" | "function_call" => Some(Self::ToolChoice),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::MaxCompletionTokens => "max_completion_tokens",
            Self::ReasoningEffort => "reasoning_effort",
            Self::Tools => "tools",
            Self::ToolChoice => "tool_choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_completion_tokens: None,
            reasoning_effort: None,
            tools: Vec::new(),
            tool_choice: None,
            stream: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_completion_tokens);
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Drops a single optional field. Removing `Tools` also drops `tool_choice`.
    pub fn clear_parameter(&mut self, parameter: RequestParameter) {
        match parameter {
            RequestParameter::Temperature => self.temperature = None,
            RequestParameter::MaxCompletionTokens => self.max_completion_tokens = None,
            RequestParameter::ReasoningEffort => self.reasoning_effort = None,
            RequestParameter::Tools => {
                self.tools.clear();
                self.tool_choice = None;
            }
            RequestParameter::ToolChoice => self.tool_choice = None,
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if self.max_completion_tokens == Some(0) {
            return Err(ProviderError::invalid_request(
                "max_completion_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        for message in &self.messages {
            if message.role == Role::Tool && message.tool_call_id.is_none() {
                return Err(ProviderError::invalid_request(
                    "tool messages must reference a tool call id",
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("stop") => Self::Stop,
            Some("length") => Self::Length,
            Some("tool_calls") | Some("function_call") => Self::ToolCalls,
            Some("content_filter") => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub model: String,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRef>,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

/// Partial tool call carried by one stream chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamChunk {
    pub model: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            content: Some(delta.into()),
            ..Self::default()
        }
    }

    pub fn tool_call(delta: ToolCallDelta) -> Self {
        Self {
            tool_calls: vec![delta],
            ..Self::default()
        }
    }

    pub fn finished(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn chat_request_validate_enforces_contract() {
        let empty_model = ChatRequest::new("  ", vec![Message::user("hi")]);
        assert_eq!(
            empty_model.validate().expect_err("empty model").kind,
            ProviderErrorKind::InvalidRequest
        );

        let empty_messages = ChatRequest::new("gpt", Vec::new());
        assert!(empty_messages.validate().is_err());

        let bad_temperature = ChatRequest::new("gpt", vec![Message::user("hi")]).with_temperature(2.5);
        assert!(bad_temperature.validate().is_err());

        let orphan_tool = ChatRequest::new(
            "gpt",
            vec![Message {
                role: Role::Tool,
                content: Some("{}".into()),
                tool_calls: Vec::new(),
                tool_call_id: None,
                name: None,
            }],
        );
        assert!(orphan_tool.validate().is_err());

        let valid = ChatRequest::new("gpt", vec![Message::user("hi")])
            .with_temperature(0.1)
            .with_max_completion_tokens(64)
            .enable_streaming();
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn clearing_tools_also_clears_tool_choice() {
        let mut request = ChatRequest::new("gpt", vec![Message::user("hi")])
            .with_tools(vec![ToolDefinition {
                name: "echo".to_string(),
                description: "Echo".to_string(),
                parameters: json!({"type": "object"}),
            }])
            .with_tool_choice(ToolChoice::Auto);

        request.clear_parameter(RequestParameter::Tools);
        assert!(request.tools.is_empty());
        assert_eq!(request.tool_choice, None);
    }

    #[test]
    fn parts_content_flattens_text_fields() {
        let content = MessageContent::Parts(vec![
            json!({"type": "text", "text": "first"}),
            json!("second"),
            json!({"type": "image"}),
        ]);

        let text = content.to_text();
        assert!(text.starts_with("first\nsecond\n"));
        assert!(text.contains("image"));
    }

    #[test]
    fn tool_shaped_messages_are_detected() {
        assert!(Message::tool_result("call_1", "echo", "ok").is_tool_shaped());
        assert!(
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCallRef::function("call_1", "echo", "{}")]
            )
            .is_tool_shaped()
        );
        assert!(!Message::user("hi").is_tool_shaped());
    }

    #[test]
    fn role_and_parameter_names_round_trip() {
        for role in [Role::System, Role::User, Role::Assistant, Role::Tool] {
            assert_eq!(role.as_str().parse::<Role>().expect("role parses"), role);
        }
        assert_eq!(
            RequestParameter::from_name("max_tokens"),
            Some(RequestParameter::MaxCompletionTokens)
        );
        assert_eq!(RequestParameter::from_name("seed"), None);
    }
}
