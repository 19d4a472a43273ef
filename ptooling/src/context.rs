//! Ambient context handed to stateful tools.

use pcommon::{MetadataMap, SessionId, TraceId};
use serde_json::{Map, Value};

/// Caller-owned state injected into tools that are not stateless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub metadata: MetadataMap,
    pub values: Map<String, Value>,
}

impl ToolContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_fills_identity_metadata_and_values() {
        let context = ToolContext::new("session-9")
            .with_trace_id("trace-1")
            .with_metadata("tenant", "acme")
            .with_value("cwd", "/tmp")
            .with_value("depth", 2);

        assert_eq!(context.session_id.as_str(), "session-9");
        assert_eq!(context.trace_id.as_ref().map(TraceId::as_str), Some("trace-1"));
        assert_eq!(context.metadata.get("tenant").map(String::as_str), Some("acme"));
        assert_eq!(context.value("cwd"), Some(&json!("/tmp")));
        assert_eq!(context.value("depth"), Some(&json!(2)));
        assert_eq!(context.value("missing"), None);
    }
}
