//! Building the outgoing request for one turn.

use phistory::HistoryManager;
use pprovider::{ChatRequest, Message, ProviderConfig, Role};
use ptooling::{ToolExecutionManager, ToolMapping};

use crate::{ChatError, ChatPolicy, OrchestrationParams, TokenCounter};

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: ChatRequest,
    /// Messages as the caller supplied them, before history and system prompt.
    pub original_messages: Vec<Message>,
    pub mapping: ToolMapping,
}

pub(crate) struct RequestPreparer<'a> {
    pub config: &'a ProviderConfig,
    pub history: &'a HistoryManager,
    pub policy: &'a ChatPolicy,
    pub counter: &'a dyn TokenCounter,
}

impl RequestPreparer<'_> {
    pub fn prepare(&self, params: &OrchestrationParams) -> Result<PreparedRequest, ChatError> {
        let original_messages = if !params.messages.is_empty() {
            params.messages.clone()
        } else {
            match params.prompt.as_deref().filter(|prompt| !prompt.is_empty()) {
                Some(prompt) => vec![Message::user(prompt)],
                None => {
                    return Err(ChatError::invalid_request(
                        "either messages or prompt is required",
                    ));
                }
            }
        };

        let mut messages = original_messages.clone();
        if let Some(entries) = params.include_history.filter(|entries| *entries > 0) {
            let recent = self.history.get_chat_history(entries);
            let fitted = fit_history(
                recent,
                &messages,
                self.policy.max_input_tokens,
                self.counter,
                self.config.primary_model(),
            );
            messages.splice(0..0, fitted);
        }

        if let Some(system_prompt) = params.system_prompt.as_deref() {
            insert_system_prompt(&mut messages, system_prompt);
        }

        let (definitions, mapping) = ToolExecutionManager::discover(&params.tools);

        let model = params
            .model
            .clone()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| self.config.primary_model().to_string());
        if model.is_empty() {
            return Err(ChatError::invalid_request("no model is configured"));
        }

        let temperature = self
            .policy
            .fixed_temperature_for(&model)
            .unwrap_or(params.temperature);

        let mut request = ChatRequest::new(model, messages).with_temperature(temperature);
        if let Some(limit) = params.max_completion_tokens {
            request = request.with_max_completion_tokens(limit);
        }
        if let Some(effort) = params.reasoning_effort {
            request = request.with_reasoning_effort(effort);
        }
        if !definitions.is_empty() {
            request = request.with_tools(definitions);
        }
        if params.stream {
            request = request.enable_streaming();
        }

        Ok(PreparedRequest {
            request,
            original_messages,
            mapping,
        })
    }
}

/// Picks the newest history entries that fit next to `new_messages`.
///
/// Selection walks from newest to oldest and stops at the first entry that
/// would exceed `budget`; the result is in chronological order.
pub fn fit_history(
    history: Vec<Message>,
    new_messages: &[Message],
    budget: usize,
    counter: &dyn TokenCounter,
    model: &str,
) -> Vec<Message> {
    let mut total = counter.count_messages(new_messages, model);
    let mut fitted = Vec::new();

    for message in history.into_iter().rev() {
        let tokens = counter.count_message(&message, model);
        if total + tokens > budget {
            break;
        }
        total += tokens;
        fitted.push(message);
    }

    fitted.reverse();
    fitted
}

pub fn insert_system_prompt(messages: &mut Vec<Message>, system_prompt: &str) {
    if system_prompt.is_empty() {
        return;
    }

    let has_system = messages
        .first()
        .is_some_and(|message| message.role == Role::System);
    if !has_system {
        messages.insert(0, Message::system(system_prompt));
    }
}
