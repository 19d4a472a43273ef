//! Token estimates used for history budgeting.

use pprovider::Message;

pub trait TokenCounter: Send + Sync {
    fn count_text(&self, text: &str, model: &str) -> usize;

    /// Role, content, tool calls, name and tool call id all count.
    fn count_message(&self, message: &Message, model: &str) -> usize {
        let mut tokens = self.count_text(message.role.as_str(), model);
        tokens += self.count_text(&message.content_text(), model);

        if !message.tool_calls.is_empty() {
            let serialized = serde_json::to_string(&message.tool_calls).unwrap_or_default();
            tokens += self.count_text(&serialized, model);
        }

        if let Some(name) = &message.name {
            tokens += self.count_text(name, model);
        }

        if let Some(tool_call_id) = &message.tool_call_id {
            tokens += self.count_text(tool_call_id, model);
        }

        tokens
    }

    fn count_messages(&self, messages: &[Message], model: &str) -> usize {
        messages
            .iter()
            .map(|message| self.count_message(message, model))
            .sum()
    }
}

/// Roughly four characters per token, at least one for non-empty text.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str, _model: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        (text.chars().count() / 4).max(1)
    }
}
