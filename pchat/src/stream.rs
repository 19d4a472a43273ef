//! Assembling one assistant turn from a response or a chunk stream.

use pcommon::TextSink;
use pprovider::{ChatResponse, FinishReason, StreamChunk, ToolCallDelta, ToolCallRef};

/// Assistant text plus the tool calls it requested.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantTurn {
    pub model: Option<String>,
    pub content: String,
    pub tool_calls: Vec<ToolCallRef>,
    pub finish_reason: Option<FinishReason>,
}

impl From<ChatResponse> for AssistantTurn {
    fn from(response: ChatResponse) -> Self {
        Self {
            model: Some(response.model),
            content: response.content.unwrap_or_default(),
            tool_calls: response.tool_calls,
            finish_reason: Some(response.finish_reason),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingToolCall {
    index: u32,
    id: String,
    kind: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn into_call(self) -> ToolCallRef {
        ToolCallRef {
            id: self.id,
            kind: self.kind,
            name: self.name,
            arguments: self.arguments,
        }
    }
}

/// Folds stream chunks into an [`AssistantTurn`].
///
/// Tool-call deltas are keyed by index: a delta carrying an id for a new
/// index starts a call, later deltas append argument text. The call in
/// progress is flushed when another index starts, when any finish reason
/// arrives, and when the stream ends. The first non-empty model name is
/// written to the sink as an `[Assistant - <model>]` header.
///
/// ```rust
/// use pchat::StreamAccumulator;
/// use pprovider::{FinishReason, StreamChunk};
///
/// let mut accumulator = StreamAccumulator::new(None);
/// accumulator.push(StreamChunk::text("hi "));
/// accumulator.push(StreamChunk::text("there"));
/// accumulator.push(StreamChunk::finished(FinishReason::Stop));
///
/// let turn = accumulator.finish();
/// assert_eq!(turn.content, "hi there");
/// assert!(turn.tool_calls.is_empty());
/// ```
pub struct StreamAccumulator {
    sink: Option<TextSink>,
    model: Option<String>,
    content: String,
    tool_calls: Vec<ToolCallRef>,
    pending: Option<PendingToolCall>,
    finish_reason: Option<FinishReason>,
}

impl StreamAccumulator {
    pub fn new(sink: Option<TextSink>) -> Self {
        Self {
            sink,
            model: None,
            content: String::new(),
            tool_calls: Vec::new(),
            pending: None,
            finish_reason: None,
        }
    }

    pub fn push(&mut self, chunk: StreamChunk) {
        if self.model.is_none()
            && let Some(model) = chunk.model.filter(|model| !model.is_empty())
        {
            self.emit(&format!("[Assistant - {model}]\n"));
            self.model = Some(model);
        }

        if let Some(delta) = chunk.content.filter(|delta| !delta.is_empty()) {
            self.emit(&delta);
            self.content.push_str(&delta);
        }

        if !chunk.tool_calls.is_empty() {
            self.emit("\n");
            for delta in chunk.tool_calls {
                self.push_tool_delta(delta);
            }
        }

        if let Some(reason) = chunk.finish_reason {
            self.flush_pending();
            self.finish_reason = Some(reason);
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn finish(mut self) -> AssistantTurn {
        self.flush_pending();
        self.emit("\n");

        AssistantTurn {
            model: self.model,
            content: self.content,
            tool_calls: self.tool_calls,
            finish_reason: self.finish_reason,
        }
    }

    fn push_tool_delta(&mut self, delta: ToolCallDelta) {
        let starts_call = delta.id.as_deref().is_some_and(|id| !id.is_empty())
            && self
                .pending
                .as_ref()
                .is_none_or(|pending| pending.index != delta.index);

        if starts_call {
            self.flush_pending();
            let pending = PendingToolCall {
                index: delta.index,
                id: delta.id.unwrap_or_default(),
                kind: delta.kind.unwrap_or_else(|| "function".to_string()),
                name: delta.name.unwrap_or_default(),
                arguments: delta.arguments.unwrap_or_default(),
            };
            self.emit(&format!("tool_name:{}\n", pending.name));
            self.emit(&format!("tool_id:{}\n", pending.id));
            self.pending = Some(pending);
            return;
        }

        let Some(arguments) = delta.arguments else {
            return;
        };
        if self.pending.is_none() {
            tracing::debug!(
                phase = "stream",
                event = "orphan_tool_delta",
                index = delta.index,
                "dropping tool arguments without a started call"
            );
            return;
        }

        self.emit(&arguments);
        if let Some(pending) = self.pending.as_mut() {
            if pending.name.is_empty()
                && let Some(name) = delta.name
            {
                pending.name = name;
            }
            pending.arguments.push_str(&arguments);
        }
    }

    fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if pending.name.is_empty() {
                tracing::warn!(
                    phase = "stream",
                    event = "unnamed_tool_call",
                    call_id = %pending.id,
                    "dropping streamed tool call without a name"
                );
                return;
            }
            self.tool_calls.push(pending.into_call());
        }
    }

    fn emit(&self, text: &str) {
        if let Some(sink) = &self.sink {
            sink(text);
        }
    }
}
