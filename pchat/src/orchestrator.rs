//! The tool-calling conversation loop.
//!
//! One invocation runs PREPARE, DISPATCH and PARSE for each turn. A turn
//! that asks for tools runs them and feeds their results back as the next
//! turn's input; a turn without tool calls ends the loop.
//!
//! Dispatch goes through two layers of recovery. Rate limits are retried
//! with backoff by [`execute_with_retry`]; other classified failures are
//! turned into a rewritten request by [`plan_recovery`](crate::plan_recovery).
//! Everything else is returned with the provider error attached.

use std::sync::Arc;

use futures_timer::Delay;
use futures_util::StreamExt;
use phistory::HistoryManager;
use pcommon::TextSink;
use pprovider::{
    BoxedChunkStream, ChatRequest, ChatTransport, Message, NoopOperationHooks,
    ProviderConfig, ProviderError, ProviderFuture, ProviderOperationHooks, execute_with_retry,
};
use ptooling::{ToolExecutionManager, ToolMapping};

use crate::prepare::RequestPreparer;
use crate::recovery::{RecoveryState, detail_label, is_tool_strip, plan_recovery};
use crate::{
    AssistantTurn, ChatError, ChatPolicy, HeuristicTokenCounter, OrchestrationParams,
    PreparedRequest, StreamAccumulator, TokenCounter,
};

pub struct ChatOrchestrator {
    config: Arc<ProviderConfig>,
    transport: Arc<dyn ChatTransport>,
    history: Arc<HistoryManager>,
    base_tools: ToolExecutionManager,
    tools: ToolExecutionManager,
    stream_sink: Option<TextSink>,
    policy: ChatPolicy,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    token_counter: Arc<dyn TokenCounter>,
}

impl ChatOrchestrator {
    pub fn builder(
        config: Arc<ProviderConfig>,
        transport: Arc<dyn ChatTransport>,
    ) -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder::new(config, transport)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    pub fn history(&self) -> &Arc<HistoryManager> {
        &self.history
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    pub fn stream_sink(&self) -> Option<&TextSink> {
        self.stream_sink.as_ref()
    }

    /// Routes streamed text and tool progress to `sink`, or stops when `None`.
    ///
    /// The tool manager keeps its anti-loop memory across reconfiguration.
    pub fn configure_stream_sink(&mut self, sink: Option<TextSink>) {
        self.tools = match &sink {
            Some(sink) => self.base_tools.with_progress_sink(Arc::clone(sink)),
            None => self.base_tools.clone(),
        };
        self.stream_sink = sink;
    }

    /// Runs the conversation to completion and returns the final assistant text.
    ///
    /// Streams when `params.stream` is set.
    pub async fn invoke(&self, params: OrchestrationParams) -> Result<String, ChatError> {
        let mut params = params;
        let mut rounds = 0_usize;

        loop {
            if params.is_cancelled() {
                tracing::info!(phase = "chat", event = "cancelled", rounds, "invocation cancelled");
                return Err(ChatError::cancelled(
                    "invocation was cancelled before the next provider call",
                ));
            }

            let PreparedRequest {
                request,
                original_messages,
                mapping,
            } = self.prepare(&params)?;
            let turn = if params.stream {
                self.dispatch_stream(request, &original_messages).await?
            } else {
                self.dispatch(request, &original_messages).await?
            };
            self.history.add_entry(Message::assistant(turn.content.clone()));

            if turn.tool_calls.is_empty() {
                tracing::debug!(phase = "chat", event = "completed", rounds, "turn returned text");
                return Ok(turn.content);
            }

            if rounds >= self.policy.max_tool_rounds {
                tracing::warn!(
                    phase = "chat",
                    event = "round_limit",
                    rounds,
                    max_tool_rounds = self.policy.max_tool_rounds,
                    "model kept requesting tools"
                );
                return Err(ChatError::round_limit(format!(
                    "model requested tools after {rounds} tool rounds"
                )));
            }

            let Some(follow_up) = self.run_tool_round(&params, &turn, &mapping).await
            else {
                return Ok(turn.content);
            };

            rounds += 1;
            params = params.follow_up(follow_up);
        }
    }

    /// Same as [`invoke`](Self::invoke) with streaming forced on.
    pub async fn invoke_stream(&self, params: OrchestrationParams) -> Result<String, ChatError> {
        self.invoke(params.enable_streaming()).await
    }

    pub fn prepare(&self, params: &OrchestrationParams) -> Result<PreparedRequest, ChatError> {
        RequestPreparer {
            config: &self.config,
            history: &self.history,
            policy: &self.policy,
            counter: self.token_counter.as_ref(),
        }
        .prepare(params)
    }

    async fn dispatch(
        &self,
        request: ChatRequest,
        original_messages: &[Message],
    ) -> Result<AssistantTurn, ChatError> {
        let outcome = self
            .call_with_recovery("execute_chat", request, |transport, request| {
                transport.execute_chat(request)
            })
            .await;
        self.record(original_messages);

        Ok(AssistantTurn::from(outcome?))
    }

    async fn dispatch_stream(
        &self,
        request: ChatRequest,
        original_messages: &[Message],
    ) -> Result<AssistantTurn, ChatError> {
        let outcome = self
            .call_with_recovery("stream_chat", request, |transport, request| {
                transport.stream_chat(request)
            })
            .await;
        self.record(original_messages);

        let mut stream: BoxedChunkStream<'_> = outcome?;
        let mut accumulator = StreamAccumulator::new(self.stream_sink.clone());
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|error| {
                tracing::error!(
                    phase = "stream",
                    event = "chunk_failed",
                    provider = %self.transport.provider_name(),
                    error_kind = ?error.kind,
                    error = %error.message,
                    "stream failed mid-response"
                );
                ChatError::from(error)
            })?;
            accumulator.push(chunk);
        }

        Ok(accumulator.finish())
    }

    async fn call_with_recovery<'s, T, Call>(
        &'s self,
        operation: &'static str,
        request: ChatRequest,
        call: Call,
    ) -> Result<T, ChatError>
    where
        Call: Fn(&'s dyn ChatTransport, ChatRequest) -> ProviderFuture<'s, Result<T, ProviderError>>,
    {
        let transport: &'s dyn ChatTransport = self.transport.as_ref();
        let provider = transport.provider_name().to_string();
        let mut request = request;
        let mut state = RecoveryState::default();

        loop {
            let attempt_request = request.clone();
            let result = execute_with_retry(
                &provider,
                operation,
                &self.policy.rate_limit_retry,
                self.provider_hooks.as_ref(),
                |_attempt| call(transport, attempt_request.clone()),
                Delay::new,
            )
            .await;

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let plan = if state.attempts < self.policy.max_recovery_attempts {
                plan_recovery(&request, &error, &state)
                    .inspect_err(|_| self.log_fatal(&provider, operation, &request, &error))?
            } else {
                None
            };

            let Some((next, action)) = plan else {
                self.log_fatal(&provider, operation, &request, &error);
                return Err(ChatError::from(error));
            };

            tracing::warn!(
                phase = "recovery",
                event = "retrying",
                provider = %provider,
                operation,
                model = %request.model,
                error_kind = ?error.kind,
                detail = %detail_label(&error),
                action = ?action,
                attempt = state.attempts + 1,
                "recoverable provider failure, retrying with adjusted request"
            );

            state.attempts += 1;
            state.tools_stripped |= is_tool_strip(&action);
            request = next;
        }
    }

    async fn run_tool_round(
        &self,
        params: &OrchestrationParams,
        turn: &AssistantTurn,
        mapping: &ToolMapping,
    ) -> Option<Vec<Message>> {
        let mut calls = Vec::with_capacity(turn.tool_calls.len());
        let mut results = Vec::with_capacity(turn.tool_calls.len());

        for call in &turn.tool_calls {
            let Some(binding) = mapping.get(&call.name) else {
                tracing::warn!(
                    phase = "tool",
                    event = "unmapped",
                    tool_name = %call.name,
                    call_id = %call.id,
                    "no tool mapping found, skipping call"
                );
                continue;
            };

            let (record, result) = self
                .tools
                .execute(binding, &turn.content, call, params.context.as_ref())
                .await;
            calls.push(record);
            results.push(result);
        }

        if calls.is_empty() {
            return None;
        }

        let mut messages = Vec::with_capacity(results.len() + 1);
        messages.push(Message::assistant_with_tool_calls(turn.content.clone(), calls));
        messages.extend(results);
        Some(messages)
    }

    fn record(&self, messages: &[Message]) {
        for message in messages {
            self.history.add_entry(message.clone());
        }
    }

    fn log_fatal(&self, provider: &str, operation: &str, request: &ChatRequest, error: &ProviderError) {
        tracing::error!(
            phase = "dispatch",
            event = "fatal",
            provider = %provider,
            operation,
            model = %request.model,
            messages = request.messages.len(),
            temperature = ?request.temperature,
            max_completion_tokens = ?request.max_completion_tokens,
            reasoning_effort = ?request.reasoning_effort,
            tools = ?request.tool_names(),
            stream = request.stream,
            error_kind = ?error.kind,
            status = ?error.status,
            error = %error.message,
            "provider request failed"
        );
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("provider", &self.transport.provider_name())
            .field("primary_model", &self.config.primary_model())
            .field("history", &self.history)
            .field("streaming_sink", &self.stream_sink.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

pub struct ChatOrchestratorBuilder {
    config: Arc<ProviderConfig>,
    transport: Arc<dyn ChatTransport>,
    history: Option<Arc<HistoryManager>>,
    tools: ToolExecutionManager,
    stream_sink: Option<TextSink>,
    policy: ChatPolicy,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    token_counter: Arc<dyn TokenCounter>,
}

impl ChatOrchestratorBuilder {
    pub fn new(config: Arc<ProviderConfig>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            config,
            transport,
            history: None,
            tools: ToolExecutionManager::new(),
            stream_sink: None,
            policy: ChatPolicy::default(),
            provider_hooks: Arc::new(NoopOperationHooks),
            token_counter: Arc::new(HeuristicTokenCounter),
        }
    }

    pub fn history(mut self, history: Arc<HistoryManager>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn tool_manager(mut self, tools: ToolExecutionManager) -> Self {
        self.tools = tools;
        self
    }

    pub fn stream_sink(mut self, sink: TextSink) -> Self {
        self.stream_sink = Some(sink);
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    pub fn build(self) -> ChatOrchestrator {
        let mut orchestrator = ChatOrchestrator {
            config: self.config,
            transport: self.transport,
            history: self
                .history
                .unwrap_or_else(|| Arc::new(HistoryManager::in_memory())),
            base_tools: self.tools.clone(),
            tools: self.tools,
            stream_sink: None,
            policy: self.policy,
            provider_hooks: self.provider_hooks,
            token_counter: self.token_counter,
        };
        orchestrator.configure_stream_sink(self.stream_sink);
        orchestrator
    }
}
