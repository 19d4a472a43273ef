//! Focused unit tests for OpenAI adapter internals.

#![cfg(test)]

use reqwest::StatusCode;
use serde_json::json;

use crate::{
    ChatRequest, ChatResponse, FinishReason, Message, ProviderErrorKind, StreamChunk,
    TokenParameter, ToolCallDelta, ToolCallRef, ToolChoice, ToolDefinition,
};

use super::serde_api::{OpenAiApiResponse, OpenAiApiStreamResponse, build_api_request};
use super::transport::{SseEvent, SseLineBuffer, error_from_body, parse_sse_line};

fn lookup_tool() -> ToolDefinition {
    ToolDefinition {
        name: "lookup".to_string(),
        description: "Look up a record".to_string(),
        parameters: json!({"type": "object", "properties": {"id": {"type": "string"}}}),
    }
}

#[test]
fn build_api_request_clamps_completion_ceiling() {
    let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")])
        .with_max_completion_tokens(200_000);

    let api = build_api_request(&request, TokenParameter::MaxCompletionTokens, 150_000)
        .expect("request should build");

    assert_eq!(api.max_completion_tokens, Some(150_000));
    assert_eq!(api.max_tokens, None);
}

#[test]
fn build_api_request_switches_token_parameter_name() {
    let request = ChatRequest::new("legacy-model", vec![Message::user("hi")])
        .with_max_completion_tokens(512);

    let api = build_api_request(&request, TokenParameter::MaxTokens, 150_000)
        .expect("request should build");
    let body = serde_json::to_value(&api).expect("request should serialize");

    assert_eq!(body["max_tokens"], json!(512));
    assert!(body.get("max_completion_tokens").is_none());
}

#[test]
fn build_api_request_serializes_tools_and_tool_messages() {
    let call = ToolCallRef::function("call_1", "lookup", r#"{"id":"42"}"#);
    let request = ChatRequest::new(
        "gpt-4o-mini",
        vec![
            Message::user("find 42"),
            Message::assistant_with_tool_calls("", vec![call]),
            Message::tool_result("call_1", "lookup", "found"),
        ],
    )
    .with_tools(vec![lookup_tool()])
    .with_tool_choice(ToolChoice::Function("lookup".to_string()));

    let api = build_api_request(&request, TokenParameter::MaxCompletionTokens, 150_000)
        .expect("request should build");
    let body = serde_json::to_value(&api).expect("request should serialize");

    assert_eq!(body["tools"][0]["type"], json!("function"));
    assert_eq!(body["tools"][0]["function"]["name"], json!("lookup"));
    assert_eq!(
        body["tool_choice"],
        json!({"type": "function", "function": {"name": "lookup"}})
    );
    assert_eq!(body["messages"][1]["tool_calls"][0]["id"], json!("call_1"));
    assert_eq!(
        body["messages"][1]["tool_calls"][0]["function"]["arguments"],
        json!(r#"{"id":"42"}"#)
    );
    assert_eq!(body["messages"][2]["role"], json!("tool"));
    assert_eq!(body["messages"][2]["tool_call_id"], json!("call_1"));
    assert!(body.get("temperature").is_none());
    assert_eq!(body["stream"], json!(false));
}

#[test]
fn response_conversion_reads_tool_calls_and_usage() {
    let parsed: OpenAiApiResponse = serde_json::from_value(json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": {"name": "lookup", "arguments": "{}"}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    }))
    .expect("response should parse");

    let response = ChatResponse::try_from(parsed).expect("conversion should succeed");

    assert_eq!(response.content, None);
    assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    assert_eq!(
        response.tool_calls,
        vec![ToolCallRef::function("call_9", "lookup", "{}")]
    );
    assert_eq!(response.usage.total_tokens, 15);
}

#[test]
fn response_without_choices_is_a_transport_error() {
    let parsed: OpenAiApiResponse =
        serde_json::from_value(json!({"model": "m", "choices": []})).expect("should parse");

    let error = ChatResponse::try_from(parsed).expect_err("must fail");
    assert_eq!(error.kind, ProviderErrorKind::Transport);
}

#[test]
fn stream_chunk_conversion_keeps_tool_call_fragments() {
    let parsed: OpenAiApiStreamResponse = serde_json::from_value(json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "delta": {
                "content": "",
                "tool_calls": [{
                    "index": 1,
                    "id": "call_2",
                    "type": "function",
                    "function": {"name": "lookup", "arguments": "{\"id\""}
                }]
            },
            "finish_reason": null
        }]
    }))
    .expect("chunk should parse");

    let chunk = StreamChunk::from(parsed);

    assert_eq!(chunk.content, None);
    assert_eq!(chunk.finish_reason, None);
    assert_eq!(
        chunk.tool_calls,
        vec![ToolCallDelta {
            index: 1,
            id: Some("call_2".to_string()),
            kind: Some("function".to_string()),
            name: Some("lookup".to_string()),
            arguments: Some("{\"id\"".to_string()),
        }]
    );
}

#[test]
fn sse_line_buffer_waits_for_complete_lines() {
    let mut buffer = SseLineBuffer::default();
    buffer.push(b"data: {\"choi");
    assert_eq!(buffer.next_line().expect("utf8"), None);

    buffer.push(b"ces\":[]}\n\ndata: [DONE]\n");
    assert_eq!(
        buffer.next_line().expect("utf8"),
        Some("data: {\"choices\":[]}".to_string())
    );
    assert_eq!(buffer.next_line().expect("utf8"), Some(String::new()));
    assert_eq!(
        buffer.next_line().expect("utf8"),
        Some("data: [DONE]".to_string())
    );
    assert_eq!(buffer.next_line().expect("utf8"), None);
}

#[test]
fn sse_line_buffer_joins_split_multibyte_characters() {
    let text = "data: {\"choices\":[{\"delta\":{\"content\":\"é\"}}]}\n";
    let bytes = text.as_bytes();
    let split = text.find('é').expect("accent present") + 1;

    let mut buffer = SseLineBuffer::default();
    buffer.push(&bytes[..split]);
    assert_eq!(buffer.next_line().expect("utf8"), None);
    buffer.push(&bytes[split..]);

    let line = buffer.next_line().expect("utf8").expect("line ready");
    match parse_sse_line(&line).expect("line should parse") {
        SseEvent::Chunk(chunk) => assert_eq!(chunk.content.as_deref(), Some("é")),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn parse_sse_line_handles_comments_done_and_errors() {
    assert_eq!(parse_sse_line(": keep-alive").expect("ok"), SseEvent::Skip);
    assert_eq!(parse_sse_line("").expect("ok"), SseEvent::Skip);
    assert_eq!(parse_sse_line("data: [DONE]").expect("ok"), SseEvent::Done);

    let error = parse_sse_line(
        r#"data: {"error":{"message":"This model's maximum context length is 8192 tokens","code":"context_length_exceeded"}}"#,
    )
    .expect_err("error envelope must surface");
    assert_eq!(error.kind, ProviderErrorKind::ContextWindowExceeded);

    let garbage = parse_sse_line("data: not-json").expect_err("garbage must fail");
    assert_eq!(garbage.kind, ProviderErrorKind::Transport);
}

#[test]
fn mid_stream_error_envelope_is_not_an_empty_chunk() {
    let error = parse_sse_line(
        r#"data: {"error":{"message":"Rate limit reached for requests","code":"rate_limit_exceeded"}}"#,
    )
    .expect_err("rate limit envelope must surface");
    assert_eq!(error.kind, ProviderErrorKind::RateLimited);
    assert!(error.retryable);

    let plain = parse_sse_line(r#"data: {"error":{"message":"server had an error"}}"#)
        .expect_err("unclassified envelope must surface");
    assert_eq!(plain.kind, ProviderErrorKind::InvalidRequest);
    assert_eq!(plain.message, "server had an error");
}

#[test]
fn sse_line_buffer_finish_returns_unterminated_tail() {
    let mut buffer = SseLineBuffer::default();
    buffer.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"head\"}}]}\n");
    buffer.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"},\"finish_reason\":\"stop\"}]}");

    let first = buffer.next_line().expect("utf8").expect("first line ready");
    assert!(first.contains("head"));
    assert_eq!(buffer.next_line().expect("utf8"), None);

    let tail = buffer.finish().expect("utf8").expect("tail kept");
    match parse_sse_line(&tail).expect("tail should parse") {
        SseEvent::Chunk(chunk) => {
            assert_eq!(chunk.content.as_deref(), Some("tail"));
            assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(buffer.finish().expect("utf8"), None);
}

#[test]
fn sse_line_buffer_finish_ignores_trailing_whitespace() {
    let mut buffer = SseLineBuffer::default();
    buffer.push(b"data: [DONE]\n  \r");
    assert_eq!(
        buffer.next_line().expect("utf8"),
        Some("data: [DONE]".to_string())
    );
    assert_eq!(buffer.finish().expect("utf8"), None);
}

#[test]
fn error_from_body_maps_status_then_classifies_message() {
    let auth = error_from_body(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    );
    assert_eq!(auth.kind, ProviderErrorKind::Authentication);
    assert_eq!(auth.status, Some(401));

    let limited = error_from_body(StatusCode::TOO_MANY_REQUESTS, "");
    assert_eq!(limited.kind, ProviderErrorKind::RateLimited);
    assert!(limited.retryable);

    let tools = error_from_body(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"message":"tools is not supported in this model","param":"tools","code":"unsupported_parameter"}}"#,
    );
    assert_eq!(tools.kind, ProviderErrorKind::ToolsUnsupported);
    assert_eq!(tools.status, Some(400));

    let unavailable = error_from_body(StatusCode::SERVICE_UNAVAILABLE, "upstream down");
    assert_eq!(unavailable.kind, ProviderErrorKind::Unavailable);
    assert_eq!(unavailable.message, "upstream down");
}
