//! OpenAI-compatible HTTP payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    ChatRequest, ChatResponse, FinishReason, Message, MessageContent, ProviderError, StreamChunk,
    TokenParameter, TokenUsage, ToolCallDelta, ToolCallRef, ToolChoice, ToolDefinition,
};

/// Builds the wire payload, clamping the completion ceiling to `token_ceiling`.
pub(crate) fn build_api_request(
    request: &ChatRequest,
    token_parameter: TokenParameter,
    token_ceiling: u32,
) -> Result<OpenAiApiRequest, ProviderError> {
    if request.messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "chat request requires at least one message",
        ));
    }

    let messages = request
        .messages
        .iter()
        .map(OpenAiApiMessage::from)
        .collect::<Vec<_>>();
    let tools = (!request.tools.is_empty())
        .then(|| request.tools.iter().map(OpenAiApiTool::from).collect());
    let max_tokens = request
        .max_completion_tokens
        .map(|requested| requested.min(token_ceiling));
    let (max_tokens, max_completion_tokens) = match token_parameter {
        TokenParameter::MaxTokens => (max_tokens, None),
        TokenParameter::MaxCompletionTokens => (None, max_tokens),
    };

    Ok(OpenAiApiRequest {
        model: request.model.clone(),
        messages,
        tools,
        tool_choice: request.tool_choice.as_ref().map(tool_choice_value),
        temperature: request.temperature,
        max_tokens,
        max_completion_tokens,
        reasoning_effort: request
            .reasoning_effort
            .map(|effort| effort.as_str().to_string()),
        stream: request.stream,
    })
}

fn tool_choice_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::None => json!("none"),
        ToolChoice::Required => json!("required"),
        ToolChoice::Function(name) => json!({"type": "function", "function": {"name": name}}),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiErrorInfo {
    pub message: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

pub(crate) fn extract_error(body: &str) -> Option<ApiErrorInfo> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    let code = parsed.error.code.and_then(|code| match code {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    });
    Some(ApiErrorInfo {
        message: parsed.error.message,
        param: parsed.error.param,
        code,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiErrorEnvelope {
    pub error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiError {
    pub message: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiMessage {
    pub role: String,
    pub content: Option<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&Message> for OpenAiApiMessage {
    fn from(value: &Message) -> Self {
        let tool_calls = (!value.tool_calls.is_empty()).then(|| {
            value
                .tool_calls
                .iter()
                .map(OpenAiApiToolCall::from)
                .collect()
        });

        Self {
            role: value.role.as_str().to_string(),
            content: value.content.clone(),
            tool_calls,
            tool_call_id: value.tool_call_id.clone(),
            name: value.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiTool {
    pub r#type: String,
    pub function: OpenAiApiFunction,
}

impl From<&ToolDefinition> for OpenAiApiTool {
    fn from(value: &ToolDefinition) -> Self {
        Self {
            r#type: "function".to_string(),
            function: OpenAiApiFunction {
                name: value.name.clone(),
                description: value.description.clone(),
                parameters: value.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAiApiToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_kind")]
    pub kind: String,
    pub function: OpenAiApiToolFunction,
}

fn default_tool_kind() -> String {
    "function".to_string()
}

impl From<&ToolCallRef> for OpenAiApiToolCall {
    fn from(value: &ToolCallRef) -> Self {
        Self {
            id: value.id.clone(),
            kind: value.kind.clone(),
            function: OpenAiApiToolFunction {
                name: value.name.clone(),
                arguments: value.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAiApiToolFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<OpenAiApiChoice>,
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiChoice {
    pub message: OpenAiApiAssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiAssistantMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl TryFrom<OpenAiApiResponse> for ChatResponse {
    type Error = ProviderError;

    fn try_from(value: OpenAiApiResponse) -> Result<Self, Self::Error> {
        let choice = value
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::transport("provider response did not include choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRef {
                id: call.id,
                kind: call.kind,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        let usage = value
            .usage
            .map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(Self {
            model: value.model,
            content: choice.message.content,
            tool_calls,
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamResponse {
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamChoice {
    #[serde(default)]
    pub delta: Option<OpenAiApiStreamDelta>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub function: Option<OpenAiApiDeltaToolFunction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl From<OpenAiApiStreamResponse> for StreamChunk {
    fn from(value: OpenAiApiStreamResponse) -> Self {
        let mut chunk = StreamChunk {
            model: value.model.filter(|model| !model.is_empty()),
            ..StreamChunk::default()
        };

        let Some(choice) = value.choices.into_iter().next() else {
            return chunk;
        };

        chunk.finish_reason = choice
            .finish_reason
            .as_deref()
            .map(|reason| FinishReason::parse(Some(reason)));

        if let Some(delta) = choice.delta {
            chunk.content = delta.content.filter(|content| !content.is_empty());
            chunk.tool_calls = delta
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| {
                    let (name, arguments) = match call.function {
                        Some(function) => (function.name, function.arguments),
                        None => (None, None),
                    };
                    ToolCallDelta {
                        index: call.index.unwrap_or(0),
                        id: call.id,
                        kind: call.kind,
                        name,
                        arguments,
                    }
                })
                .collect();
        }

        chunk
    }
}
