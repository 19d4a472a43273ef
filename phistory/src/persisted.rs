//! On-disk shape of a message, shared by the durable stores.

use pprovider::{Message, MessageContent, Role, ToolCallRef};
use serde::{Deserialize, Serialize};

use crate::HistoryError;

pub(crate) const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PersistedMessage {
    role: String,
    #[serde(default)]
    content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ToolCallRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl PersistedMessage {
    pub(crate) fn from_message(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls: message.tool_calls.clone(),
            tool_call_id: message.tool_call_id.clone(),
            name: message.name.clone(),
        }
    }

    pub(crate) fn into_message(self) -> Result<Message, HistoryError> {
        let role = self.role.parse::<Role>().map_err(|_| {
            HistoryError::serialization(format!("unknown history role value '{}'", self.role))
        })?;

        Ok(Message {
            role,
            content: self.content,
            tool_calls: self.tool_calls,
            tool_call_id: self.tool_call_id,
            name: self.name,
        })
    }
}

/// Versioned document; a bare message array is accepted when reading.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum PersistedDocument {
    Versioned {
        version: u32,
        messages: Vec<PersistedMessage>,
    },
    Bare(Vec<PersistedMessage>),
}

impl PersistedDocument {
    pub(crate) fn from_messages(messages: &[Message]) -> Self {
        Self::Versioned {
            version: DOCUMENT_VERSION,
            messages: messages.iter().map(PersistedMessage::from_message).collect(),
        }
    }

    pub(crate) fn into_messages(self) -> Result<Vec<Message>, HistoryError> {
        let messages = match self {
            Self::Versioned { version, messages } => {
                if version > DOCUMENT_VERSION {
                    return Err(HistoryError::serialization(format!(
                        "history document version {version} is newer than supported version {DOCUMENT_VERSION}"
                    )));
                }
                messages
            }
            Self::Bare(messages) => messages,
        };

        messages
            .into_iter()
            .map(PersistedMessage::into_message)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::HistoryErrorKind;

    #[test]
    fn tool_shaped_messages_survive_persistence() {
        let messages = vec![
            Message::assistant_with_tool_calls(
                "checking",
                vec![ToolCallRef::function("call_1", "lookup", "{}")],
            ),
            Message::tool_result("call_1", "lookup", MessageContent::Parts(vec![json!("a")])),
        ];

        let encoded = serde_json::to_string(&PersistedDocument::from_messages(&messages))
            .expect("document should encode");
        let decoded = serde_json::from_str::<PersistedDocument>(&encoded)
            .expect("document should decode")
            .into_messages()
            .expect("messages should convert");

        assert_eq!(decoded, messages);
    }

    #[test]
    fn bare_arrays_and_null_content_are_accepted() {
        let document = serde_json::from_value::<PersistedDocument>(json!([
            {"role": "user", "content": "hello"},
            {"role": "assistant", "content": null}
        ]))
        .expect("bare array should decode");

        let messages = document.into_messages().expect("messages should convert");
        assert_eq!(messages[0], Message::user("hello"));
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, None);
    }

    #[test]
    fn unknown_roles_and_future_versions_are_rejected() {
        let unknown = serde_json::from_value::<PersistedDocument>(json!([
            {"role": "narrator", "content": "once upon a time"}
        ]))
        .expect("shape is valid")
        .into_messages()
        .expect_err("role must be rejected");
        assert_eq!(unknown.kind, HistoryErrorKind::Serialization);

        let future = serde_json::from_value::<PersistedDocument>(json!({
            "version": 99,
            "messages": []
        }))
        .expect("shape is valid")
        .into_messages()
        .expect_err("version must be rejected");
        assert!(future.message.contains("99"));
    }
}
