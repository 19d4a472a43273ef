//! Request rewrites for recoverable provider failures.
//!
//! The transport has already classified the failure; this module only
//! decides how the next attempt differs from the failed one. Anything it
//! cannot rewrite is fatal and returned to the caller unchanged.

use pprovider::{ChatRequest, ErrorDetail, Message, ProviderError, ProviderErrorKind, RequestParameter, Role};

use crate::ChatError;

const DEFAULT_FIXED_TEMPERATURE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    StripTools,
    ClampCompletionTokens(u32),
    ReduceMessages,
    ForceTemperature(f32),
    DropParameter(RequestParameter),
}

/// Per-dispatch bookkeeping so recovery cannot loop.
#[derive(Debug, Clone, Default)]
pub struct RecoveryState {
    pub attempts: usize,
    pub tools_stripped: bool,
}

/// Returns the rewritten request for a recoverable failure, or `None` when
/// the failure is fatal.
pub fn plan_recovery(
    request: &ChatRequest,
    error: &ProviderError,
    state: &RecoveryState,
) -> Result<Option<(ChatRequest, RecoveryAction)>, ChatError> {
    let mut next = request.clone();

    let action = match error.kind {
        ProviderErrorKind::ToolsUnsupported => {
            if state.tools_stripped {
                return Ok(None);
            }
            strip_tools(&mut next);
            RecoveryAction::StripTools
        }
        ProviderErrorKind::CompletionTokenLimit => {
            let Some(limit) = error.token_limit().filter(|limit| *limit > 0) else {
                return Ok(None);
            };
            next.max_completion_tokens = Some(limit);
            RecoveryAction::ClampCompletionTokens(limit)
        }
        ProviderErrorKind::ContextWindowExceeded => {
            next.messages = reduce_messages(&request.messages)
                .map_err(|message| ChatError::provider(error.clone(), message))?;
            RecoveryAction::ReduceMessages
        }
        ProviderErrorKind::FixedTemperature => {
            let temperature = error
                .required_temperature()
                .unwrap_or(DEFAULT_FIXED_TEMPERATURE);
            next.temperature = Some(temperature);
            RecoveryAction::ForceTemperature(temperature)
        }
        ProviderErrorKind::UnsupportedParameter => {
            let Some(parameter) = error.parameter().and_then(RequestParameter::from_name) else {
                return Ok(None);
            };
            if parameter == RequestParameter::Tools {
                if state.tools_stripped {
                    return Ok(None);
                }
                strip_tools(&mut next);
            } else {
                next.clear_parameter(parameter);
            }
            RecoveryAction::DropParameter(parameter)
        }
        _ => return Ok(None),
    };

    if next == *request || next.messages.is_empty() {
        return Ok(None);
    }

    Ok(Some((next, action)))
}

pub fn is_tool_strip(action: &RecoveryAction) -> bool {
    matches!(
        action,
        RecoveryAction::StripTools | RecoveryAction::DropParameter(RequestParameter::Tools)
    )
}

fn strip_tools(request: &mut ChatRequest) {
    request.clear_parameter(RequestParameter::Tools);
    request.messages = strip_tool_messages(&request.messages);
}

/// Drops tool results and assistant messages that carry tool calls.
pub fn strip_tool_messages(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|message| !message.is_tool_shaped())
        .cloned()
        .collect()
}

/// Keeps a leading system message and the newer half of the rest, starting
/// at a user or assistant message.
///
/// Fails when only one non-system message is left to send.
pub fn reduce_messages(messages: &[Message]) -> Result<Vec<Message>, String> {
    let Some(first) = messages.first() else {
        return Err("messages are required".to_string());
    };

    let has_system = first.role == Role::System;
    let tail = if has_system { &messages[1..] } else { messages };
    if tail.len() <= 1 {
        return Err("input text exceeded input token limit".to_string());
    }

    let half = tail.len() / 2;
    let start = (0..=half)
        .rev()
        .find(|index| matches!(tail[*index].role, Role::User | Role::Assistant))
        .unwrap_or(half);

    let mut reduced = Vec::with_capacity(tail.len() - start + 1);
    if has_system {
        reduced.push(first.clone());
    }
    reduced.extend_from_slice(&tail[start..]);
    Ok(reduced)
}

pub(crate) fn detail_label(error: &ProviderError) -> String {
    match &error.detail {
        Some(ErrorDetail::TokenLimit(limit)) => limit.to_string(),
        Some(ErrorDetail::Temperature(value)) => value.to_string(),
        Some(ErrorDetail::Parameter(name)) => name.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use pprovider::{ToolCallRef, ToolDefinition, ToolChoice};
    use serde_json::json;

    use super::*;

    fn tool_request() -> ChatRequest {
        ChatRequest::new(
            "gpt-4o",
            vec![
                Message::system("sys"),
                Message::user("ping"),
                Message::assistant_with_tool_calls(
                    "",
                    vec![ToolCallRef::function("c1", "echo", "{}")],
                ),
                Message::tool_result("c1", "echo", "pong"),
            ],
        )
        .with_temperature(0.1)
        .with_max_completion_tokens(200_000)
        .with_tools(vec![ToolDefinition {
            name: "echo".to_string(),
            description: "Echo".to_string(),
            parameters: json!({"type": "object"}),
        }])
        .with_tool_choice(ToolChoice::Auto)
    }

    #[test]
    fn tools_unsupported_strips_schema_and_tool_messages_once() {
        let request = tool_request();
        let error = ProviderError::tools_unsupported("does not support parameters: ['tools']");

        let (next, action) = plan_recovery(&request, &error, &RecoveryState::default())
            .expect("plan")
            .expect("recoverable");
        assert_eq!(action, RecoveryAction::StripTools);
        assert!(next.tools.is_empty());
        assert!(next.tool_choice.is_none());
        assert_eq!(next.messages, vec![Message::system("sys"), Message::user("ping")]);

        let stripped = RecoveryState {
            attempts: 1,
            tools_stripped: true,
        };
        assert!(plan_recovery(&next, &error, &stripped).expect("plan").is_none());
    }

    #[test]
    fn token_limit_clamps_to_named_value() {
        let request = tool_request();
        let error = ProviderError::completion_token_limit("exceeds the model limit of 16384", 16_384);

        let (next, action) = plan_recovery(&request, &error, &RecoveryState::default())
            .expect("plan")
            .expect("recoverable");
        assert_eq!(action, RecoveryAction::ClampCompletionTokens(16_384));
        assert_eq!(next.max_completion_tokens, Some(16_384));

        assert!(
            plan_recovery(&next, &error, &RecoveryState::default())
                .expect("plan")
                .is_none(),
            "clamping to the same value again makes no progress"
        );
    }

    #[test]
    fn fixed_temperature_and_unsupported_parameter_rewrite_request() {
        let request = tool_request();

        let (next, _) = plan_recovery(
            &request,
            &ProviderError::fixed_temperature("Only temperature=1 is supported", 1.0),
            &RecoveryState::default(),
        )
        .expect("plan")
        .expect("recoverable");
        assert_eq!(next.temperature, Some(1.0));

        let (next, action) = plan_recovery(
            &request,
            &ProviderError::unsupported_parameter("unexpected keyword argument 'temperature'", "temperature"),
            &RecoveryState::default(),
        )
        .expect("plan")
        .expect("recoverable");
        assert_eq!(action, RecoveryAction::DropParameter(RequestParameter::Temperature));
        assert!(next.temperature.is_none());
        assert_eq!(next.messages.len(), 4);

        let (next, action) = plan_recovery(
            &request,
            &ProviderError::unsupported_parameter("unexpected keyword argument 'tools'", "tools"),
            &RecoveryState::default(),
        )
        .expect("plan")
        .expect("recoverable");
        assert!(is_tool_strip(&action));
        assert_eq!(next.messages.len(), 2);
    }

    #[test]
    fn unknown_parameter_and_other_kinds_are_fatal() {
        let request = tool_request();
        let state = RecoveryState::default();

        assert!(
            plan_recovery(
                &request,
                &ProviderError::unsupported_parameter("unexpected keyword argument 'seed'", "seed"),
                &state,
            )
            .expect("plan")
            .is_none()
        );
        assert!(
            plan_recovery(&request, &ProviderError::authentication("nope"), &state)
                .expect("plan")
                .is_none()
        );
        assert!(
            plan_recovery(&request, &ProviderError::rate_limited("slow"), &state)
                .expect("plan")
                .is_none()
        );
    }

    #[test]
    fn reduce_keeps_system_and_newer_half() {
        let messages = vec![
            Message::system("sys"),
            Message::user("u1"),
            Message::assistant("a1"),
            Message::user("u2"),
            Message::assistant("a2"),
        ];

        let reduced = reduce_messages(&messages).expect("reducible");
        assert_eq!(
            reduced,
            vec![Message::system("sys"), Message::user("u2"), Message::assistant("a2")]
        );
    }

    #[test]
    fn reduce_moves_cut_back_to_a_conversational_message() {
        let messages = vec![
            Message::user("u1"),
            Message::assistant_with_tool_calls("", vec![ToolCallRef::function("c1", "t", "{}")]),
            Message::tool_result("c1", "t", "r1"),
            Message::tool_result("c1", "t", "r2"),
        ];

        let reduced = reduce_messages(&messages).expect("reducible");
        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[0].role, Role::Assistant);
    }

    #[test]
    fn reduce_fails_on_a_single_remaining_message() {
        let messages = vec![Message::system("sys"), Message::user("huge")];
        assert_eq!(
            reduce_messages(&messages).expect_err("fatal"),
            "input text exceeded input token limit"
        );
        assert!(reduce_messages(&[]).is_err());
    }

    #[test]
    fn context_overflow_on_single_message_is_fatal_with_provider_error() {
        let request = ChatRequest::new("gpt-4o", vec![Message::user("huge")]);
        let provider = ProviderError::context_window_exceeded("Input is too long for requested model");

        let error = plan_recovery(&request, &provider, &RecoveryState::default())
            .expect_err("fatal");
        assert_eq!(error.provider_error(), Some(&provider));
        assert_eq!(error.message, "input text exceeded input token limit");
    }
}
