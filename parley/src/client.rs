//! One-shot completions with model fallback.
//!
//! Unlike [`ChatOrchestrator`](crate::ChatOrchestrator), the client runs no
//! tools, records no history and applies no recovery: each configured model
//! is tried in preference order and the first answer wins.

use std::sync::Arc;

use futures_util::StreamExt;
use pchat::{ChatPolicy, DEFAULT_TEMPERATURE, insert_system_prompt};
use pcommon::TextSink;
use pprovider::{ChatRequest, ChatTransport, Message, ProviderConfig, ProviderError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Only this model is tried when set.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_completion_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

#[derive(Clone)]
pub struct CompletionClient {
    config: Arc<ProviderConfig>,
    transport: Arc<dyn ChatTransport>,
    policy: ChatPolicy,
    preferred_model: Option<String>,
}

impl CompletionClient {
    pub fn new(config: Arc<ProviderConfig>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            config,
            transport,
            policy: ChatPolicy::default(),
            preferred_model: None,
        }
    }

    pub fn with_policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    /// The user's model choice, tried before the configured order.
    pub fn select_model(&mut self, model: Option<String>) {
        self.preferred_model = model;
    }

    pub fn preferred_model(&self) -> Option<&str> {
        self.preferred_model.as_deref()
    }

    pub fn available_models(&self) -> Vec<String> {
        self.transport
            .available_models(self.preferred_model.as_deref())
    }

    /// Returns the first model's answer, or `None` when every model fails.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Option<String> {
        let messages = with_system_prompt(messages, options);
        let max_completion_tokens = options
            .max_completion_tokens
            .map(|requested| requested.min(self.config.max_completion_tokens));

        for model in self.candidates(options) {
            let request = self.request(
                &model,
                messages.clone(),
                options.temperature,
                max_completion_tokens,
            );
            match self.transport.execute_chat(request).await {
                Ok(response) => return response.content,
                Err(error) => log_model_failure(&model, "complete", &error),
            }
        }

        tracing::warn!(
            phase = "completion",
            event = "exhausted",
            operation = "complete",
            "every model failed"
        );
        None
    }

    pub async fn complete_prompt(&self, prompt: impl Into<String>) -> Option<String> {
        self.complete(vec![Message::user(prompt.into())], &CompletionOptions::default())
            .await
    }

    /// Streams content deltas to `sink`, stopping at the first model that
    /// produces text. Returns that text.
    pub async fn stream(
        &self,
        messages: Vec<Message>,
        options: &CompletionOptions,
        sink: &TextSink,
    ) -> Option<String> {
        let messages = with_system_prompt(messages, options);
        let max_completion_tokens = options
            .max_completion_tokens
            .unwrap_or(self.config.max_completion_tokens)
            .min(self.config.max_completion_tokens);
        let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);

        for model in self.candidates(options) {
            tracing::debug!(phase = "completion", event = "stream_start", model = %model);
            let request = self
                .request(
                    &model,
                    messages.clone(),
                    Some(temperature),
                    Some(max_completion_tokens),
                )
                .enable_streaming();

            let mut stream = match self.transport.stream_chat(request).await {
                Ok(stream) => stream,
                Err(error) => {
                    log_model_failure(&model, "stream", &error);
                    continue;
                }
            };

            let mut text = String::new();
            while let Some(item) = stream.next().await {
                match item {
                    Ok(chunk) => {
                        if let Some(delta) = chunk.content.filter(|delta| !delta.is_empty()) {
                            sink(&delta);
                            text.push_str(&delta);
                        }
                    }
                    Err(error) => {
                        log_model_failure(&model, "stream", &error);
                        break;
                    }
                }
            }

            if !text.is_empty() {
                return Some(text);
            }
        }

        None
    }

    fn candidates(&self, options: &CompletionOptions) -> Vec<String> {
        match &options.model {
            Some(model) => vec![model.clone()],
            None => self.available_models(),
        }
    }

    fn request(
        &self,
        model: &str,
        messages: Vec<Message>,
        temperature: Option<f32>,
        max_completion_tokens: Option<u32>,
    ) -> ChatRequest {
        let mut request = ChatRequest::new(model, messages);
        if let Some(temperature) = self.policy.fixed_temperature_for(model).or(temperature) {
            request = request.with_temperature(temperature);
        }
        if let Some(max_completion_tokens) = max_completion_tokens {
            request = request.with_max_completion_tokens(max_completion_tokens);
        }
        request
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("provider", &self.transport.provider_name())
            .field("preferred_model", &self.preferred_model)
            .finish_non_exhaustive()
    }
}

fn with_system_prompt(mut messages: Vec<Message>, options: &CompletionOptions) -> Vec<Message> {
    if let Some(system_prompt) = &options.system_prompt {
        insert_system_prompt(&mut messages, system_prompt);
    }
    messages
}

fn log_model_failure(model: &str, operation: &str, error: &ProviderError) {
    tracing::error!(
        phase = "completion",
        event = "model_failed",
        model,
        operation,
        error_kind = ?error.kind,
        error = %error,
        "model failed, trying the next one"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use pprovider::{
        BoxedChunkStream, ChatRequest, ChatResponse, ChatTransport, FinishReason, Message,
        ProviderConfig, ProviderError, ProviderFuture, Role, StreamChunk, TokenUsage,
        VecChunkStream,
    };

    use super::{CompletionClient, CompletionOptions};
    use crate::text_sink;

    /// Answers per model; models without an entry fail with a transport error.
    struct PerModelTransport {
        models: Vec<String>,
        answers: HashMap<String, Vec<StreamChunk>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl PerModelTransport {
        fn new(models: &[&str], answers: Vec<(&str, Vec<&str>)>) -> Self {
            Self {
                models: models.iter().map(|model| model.to_string()).collect(),
                answers: answers
                    .into_iter()
                    .map(|(model, deltas)| {
                        (
                            model.to_string(),
                            deltas.into_iter().map(StreamChunk::text).collect(),
                        )
                    })
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested_models(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("requests lock")
                .iter()
                .map(|request| request.model.clone())
                .collect()
        }
    }

    impl ChatTransport for PerModelTransport {
        fn provider_name(&self) -> &str {
            "per-model"
        }

        fn execute_chat<'a>(
            &'a self,
            request: ChatRequest,
        ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
            Box::pin(async move {
                self.requests
                    .lock()
                    .expect("requests lock")
                    .push(request.clone());
                let chunks = self
                    .answers
                    .get(&request.model)
                    .ok_or_else(|| ProviderError::transport("model offline"))?;
                let content: String = chunks
                    .iter()
                    .filter_map(|chunk| chunk.content.clone())
                    .collect();
                Ok(ChatResponse {
                    model: request.model,
                    content: Some(content),
                    tool_calls: Vec::new(),
                    finish_reason: FinishReason::Stop,
                    usage: TokenUsage::default(),
                })
            })
        }

        fn stream_chat<'a>(
            &'a self,
            request: ChatRequest,
        ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
            Box::pin(async move {
                self.requests
                    .lock()
                    .expect("requests lock")
                    .push(request.clone());
                let chunks = self
                    .answers
                    .get(&request.model)
                    .ok_or_else(|| ProviderError::rate_limited("rate limit reached"))?;
                let stream = VecChunkStream::new(chunks.iter().cloned().map(Ok).collect());
                Ok(Box::pin(stream) as BoxedChunkStream<'a>)
            })
        }

        fn available_models(&self, preferred: Option<&str>) -> Vec<String> {
            let preferred = preferred.filter(|model| self.models.iter().any(|m| m == model));
            preferred
                .map(str::to_string)
                .into_iter()
                .chain(
                    self.models
                        .iter()
                        .filter(|model| Some(model.as_str()) != preferred)
                        .cloned(),
                )
                .collect()
        }
    }

    fn client(transport: Arc<PerModelTransport>) -> CompletionClient {
        let models = transport.models.clone();
        let mut config = ProviderConfig::with_api_key("sk-test", models);
        config.max_completion_tokens = 1_000;
        CompletionClient::new(Arc::new(config), transport)
    }

    #[tokio::test]
    async fn complete_falls_back_to_next_model() {
        let transport = Arc::new(PerModelTransport::new(
            &["primary", "backup"],
            vec![("backup", vec!["from backup"])],
        ));

        let answer = client(transport.clone()).complete_prompt("hi").await;

        assert_eq!(answer.as_deref(), Some("from backup"));
        assert_eq!(transport.requested_models(), vec!["primary", "backup"]);
    }

    #[tokio::test]
    async fn complete_returns_none_when_every_model_fails() {
        let transport = Arc::new(PerModelTransport::new(&["a", "b"], Vec::new()));

        let answer = client(transport.clone()).complete_prompt("hi").await;

        assert_eq!(answer, None);
        assert_eq!(transport.requested_models().len(), 2);
    }

    #[tokio::test]
    async fn complete_clamps_tokens_and_prepends_system_prompt() {
        let transport = Arc::new(PerModelTransport::new(&["primary"], vec![("primary", vec!["ok"])]));
        let options = CompletionOptions::new()
            .with_max_completion_tokens(50_000)
            .with_system_prompt("Be brief.");

        client(transport.clone())
            .complete(vec![Message::user("hi")], &options)
            .await;

        let requests = transport.requests.lock().expect("requests lock");
        assert_eq!(requests[0].max_completion_tokens, Some(1_000));
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn preferred_model_is_tried_first() {
        let transport = Arc::new(PerModelTransport::new(
            &["a", "b"],
            vec![("a", vec!["from a"]), ("b", vec!["from b"])],
        ));

        let answer = client(transport.clone())
            .with_preferred_model("b")
            .complete_prompt("hi")
            .await;

        assert_eq!(answer.as_deref(), Some("from b"));
        assert_eq!(transport.requested_models(), vec!["b"]);
    }

    #[tokio::test]
    async fn stream_forwards_deltas_and_stops_at_first_model_with_text() {
        let transport = Arc::new(PerModelTransport::new(
            &["silent", "offline", "talker", "unused"],
            vec![
                ("silent", Vec::new()),
                ("talker", vec!["Hel", "lo"]),
                ("unused", vec!["never"]),
            ],
        ));
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let received = Arc::clone(&received);
            text_sink(move |delta| {
                received
                    .lock()
                    .expect("sink lock")
                    .push(delta.to_string())
            })
        };

        let text = client(transport.clone())
            .stream(vec![Message::user("hi")], &CompletionOptions::new(), &sink)
            .await;

        assert_eq!(text.as_deref(), Some("Hello"));
        assert_eq!(*received.lock().expect("sink lock"), vec!["Hel", "lo"]);
        assert_eq!(
            transport.requested_models(),
            vec!["silent", "offline", "talker"]
        );
        let requests = transport.requests.lock().expect("requests lock");
        assert!(requests.iter().all(|request| request.stream));
        assert_eq!(requests[2].temperature, Some(0.1));
        assert_eq!(requests[2].max_completion_tokens, Some(1_000));
    }

    #[tokio::test]
    async fn explicit_model_skips_fallback_and_applies_fixed_temperature() {
        let transport = Arc::new(PerModelTransport::new(
            &["gpt-4o", "gpt-5-mini"],
            vec![("gpt-4o", vec!["unused"]), ("gpt-5-mini", vec!["fixed"])],
        ));
        let sink = text_sink(|_| {});
        let options = CompletionOptions::new()
            .with_model("gpt-5-mini")
            .with_temperature(0.3);

        let text = client(transport.clone())
            .stream(vec![Message::user("hi")], &options, &sink)
            .await;

        assert_eq!(text.as_deref(), Some("fixed"));
        let requests = transport.requests.lock().expect("requests lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(1.0));
    }
}
