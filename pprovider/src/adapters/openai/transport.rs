//! reqwest-based transport for OpenAI-compatible chat completion endpoints.

use std::sync::{Arc, OnceLock};

use async_stream::try_stream;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::{
    BoxedChunkStream, ChatRequest, ChatResponse, ChatTransport, ProviderConfig, ProviderError,
    ProviderFuture, StreamChunk, classify_error,
};

use super::serde_api::{
    OpenAiApiRequest, OpenAiApiResponse, OpenAiApiStreamResponse, build_api_request,
    extract_error,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP transport whose connection is built on first use and then reused.
#[derive(Debug)]
pub struct OpenAiChatTransport {
    config: Arc<ProviderConfig>,
    client: OnceLock<Client>,
}

impl OpenAiChatTransport {
    pub fn new(config: Arc<ProviderConfig>) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    /// Uses a caller-built client instead of the lazily built default.
    pub fn with_client(self, client: Client) -> Self {
        let _ = self.client.set(client);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.get().is_some()
    }

    fn client(&self) -> Result<&Client, ProviderError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        let client = Client::builder()
            .connect_timeout(self.config.timeout.connect)
            .read_timeout(self.config.timeout.read)
            .build()
            .map_err(|err| ProviderError::transport(format!("failed to build HTTP client: {err}")))?;
        tracing::debug!(
            provider = %self.config.provider_name,
            base_url = %self.base_url(),
            "constructed provider HTTP client"
        );
        Ok(self.client.get_or_init(|| client))
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url().trim_end_matches('/'), path)
    }

    fn apply_auth(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(api_key) = self.config.api_key.as_ref().filter(|key| !key.is_empty()) {
            builder = builder.bearer_auth(api_key.expose());
        }

        for (name, value) in self.config.extra_headers() {
            builder = builder.header(name, value);
        }
        builder
    }

    fn api_request(&self, request: &ChatRequest) -> Result<OpenAiApiRequest, ProviderError> {
        request.validate()?;
        build_api_request(
            request,
            self.config.token_parameter,
            self.config.max_completion_tokens,
        )
    }

    async fn send(&self, api_request: &OpenAiApiRequest) -> Result<Response, ProviderError> {
        let builder = self
            .client()?
            .post(self.endpoint("chat/completions"))
            .json(api_request);
        let response = self
            .apply_auth(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(parse_error(response).await);
        }
        Ok(response)
    }
}

impl ChatTransport for OpenAiChatTransport {
    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn execute_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
        Box::pin(async move {
            let mut api_request = self.api_request(&request)?;
            api_request.stream = false;
            let response = self.send(&api_request).await?;

            let parsed: OpenAiApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;
            let mut response = ChatResponse::try_from(parsed)?;
            if response.model.is_empty() {
                response.model = request.model;
            }
            Ok(response)
        })
    }

    fn stream_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let mut api_request = self.api_request(&request)?;
            api_request.stream = true;
            let response = self.send(&api_request).await?;

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut lines = SseLineBuffer::default();

                let mut done = false;

                'read: while let Some(item) = bytes.next().await {
                    let item = item.map_err(map_reqwest_error)?;
                    lines.push(&item);

                    while let Some(line) = lines.next_line()? {
                        match parse_sse_line(&line)? {
                            SseEvent::Skip => continue,
                            SseEvent::Done => {
                                done = true;
                                break 'read;
                            }
                            SseEvent::Chunk(chunk) => yield chunk,
                        }
                    }
                }

                // A final event may arrive without its trailing newline.
                if !done {
                    if let Some(line) = lines.finish()? {
                        if let SseEvent::Chunk(chunk) = parse_sse_line(&line)? {
                            yield chunk;
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as BoxedChunkStream<'a>)
        })
    }

    fn available_models(&self, preferred: Option<&str>) -> Vec<String> {
        self.config
            .iter_models(preferred)
            .map(ToString::to_string)
            .collect()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

async fn parse_error(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_from_body(status, &body)
}

pub(crate) fn error_from_body(status: StatusCode, body: &str) -> ProviderError {
    let info = extract_error(body);
    let message = match &info {
        Some(info) => info.message.clone(),
        None if body.trim().is_empty() => format!("provider request failed with status {status}"),
        None => body.trim().to_string(),
    };

    let base = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            ProviderError::unavailable(message)
        }
        _ => ProviderError::transport(message),
    }
    .with_status(status.as_u16());

    let (param, code) = match &info {
        Some(info) => (info.param.as_deref(), info.code.as_deref()),
        None => (None, None),
    };
    classify_error(base, param, code)
}

/// Splits a byte stream into complete lines, keeping partial UTF-8 sequences
/// buffered until their line is finished.
#[derive(Debug, Default)]
pub(crate) struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<String>, ProviderError> {
        let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') else {
            return Ok(None);
        };

        let line = self.pending.drain(..=newline).collect::<Vec<_>>();
        let line = String::from_utf8(line)
            .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in stream: {err}")))?;
        Ok(Some(line.trim().to_string()))
    }

    /// Takes whatever is left once the byte stream has ended.
    pub(crate) fn finish(&mut self) -> Result<Option<String>, ProviderError> {
        let rest = std::mem::take(&mut self.pending);
        let rest = String::from_utf8(rest)
            .map_err(|err| ProviderError::transport(format!("invalid UTF-8 in stream: {err}")))?;
        let rest = rest.trim();
        Ok((!rest.is_empty()).then(|| rest.to_string()))
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Skip,
    Done,
    Chunk(StreamChunk),
}

pub(crate) fn parse_sse_line(line: &str) -> Result<SseEvent, ProviderError> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(SseEvent::Skip);
    }
    if payload == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    // Error envelopes also decode as an empty chunk, so they are checked first.
    if let Some(info) = extract_error(payload) {
        return Err(classify_error(
            ProviderError::invalid_request(info.message),
            info.param.as_deref(),
            info.code.as_deref(),
        ));
    }

    serde_json::from_str::<OpenAiApiStreamResponse>(payload)
        .map(|parsed| SseEvent::Chunk(StreamChunk::from(parsed)))
        .map_err(|err| ProviderError::transport(format!("failed to decode stream chunk: {err}")))
}
