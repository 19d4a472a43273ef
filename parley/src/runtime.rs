//! Runtime wiring: provider configuration, history, transport and orchestrator.
//!
//! ```rust,no_run
//! use parley::{MapConfigSource, OrchestrationParams, ParleyRuntime, RuntimeOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MapConfigSource::new()
//!     .set("llm", "api_key", "sk-test")
//!     .set("llm", "models", vec!["gpt-4o-mini"]);
//!
//! let runtime = ParleyRuntime::from_source(source, RuntimeOptions::default()).await?;
//! let answer = runtime.invoke(OrchestrationParams::prompt("hello")).await?;
//! runtime.save_history().await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use pchat::{ChatError, ChatOrchestrator, ChatPolicy, OrchestrationParams};
use pcommon::TextSink;
use phistory::{HistoryError, HistoryManager, HistoryStoreConfig, create_history_store};
use pobserve::{MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};
use pprovider::{
    ChatTransport, ConfigAdapter, ConfigError, ConfigSource, ProviderConfig,
    ProviderOperationHooks, TomlConfigSource,
};
use ptooling::{ToolExecutionManager, ToolRuntimeHooks};

use crate::CompletionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    History,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Config, message)
    }

    pub fn history(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::History, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Unsupported, message)
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

impl From<HistoryError> for RuntimeError {
    fn from(error: HistoryError) -> Self {
        Self::history(error.to_string())
    }
}

/// Which observability hooks the runtime installs on providers and tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Observability {
    Disabled,
    #[default]
    Tracing,
    Metrics,
}

#[derive(Clone)]
pub struct RuntimeOptions {
    /// Provider section to load; `None` reads `[llm] provider`.
    pub provider: Option<String>,
    pub history: HistoryStoreConfig,
    pub policy: ChatPolicy,
    pub tool_timeout: Option<Duration>,
    pub observability: Observability,
    pub stream_sink: Option<TextSink>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            provider: None,
            history: HistoryStoreConfig::default(),
            policy: ChatPolicy::default(),
            tool_timeout: None,
            observability: Observability::default(),
            stream_sink: None,
        }
    }
}

impl RuntimeOptions {
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_history(mut self, history: HistoryStoreConfig) -> Self {
        self.history = history;
        self
    }

    /// Keeps history in memory only; nothing is written on save.
    pub fn in_memory_history(self) -> Self {
        self.with_history(HistoryStoreConfig::InMemory)
    }

    pub fn with_policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn with_observability(mut self, observability: Observability) -> Self {
        self.observability = observability;
        self
    }

    pub fn with_stream_sink(mut self, sink: TextSink) -> Self {
        self.stream_sink = Some(sink);
        self
    }
}

impl std::fmt::Debug for RuntimeOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeOptions")
            .field("provider", &self.provider)
            .field("history", &self.history)
            .field("policy", &self.policy)
            .field("tool_timeout", &self.tool_timeout)
            .field("observability", &self.observability)
            .field("stream_sink", &self.stream_sink.is_some())
            .finish()
    }
}

/// The composed collaborators behind one conversation.
pub struct ParleyRuntime {
    config: Arc<ProviderConfig>,
    transport: Arc<dyn ChatTransport>,
    history: Arc<HistoryManager>,
    orchestrator: ChatOrchestrator,
}

impl ParleyRuntime {
    /// Loads the provider config from `source` and builds the default transport.
    pub async fn from_source<S>(source: S, options: RuntimeOptions) -> Result<Self, RuntimeError>
    where
        S: ConfigSource + 'static,
    {
        let adapter = ConfigAdapter::new(source);
        let config = Arc::new(adapter.load_provider_config(options.provider.as_deref())?);
        let transport = default_transport(Arc::clone(&config))?;
        Self::with_transport(config, transport, options).await
    }

    /// Reads `$PARLEY_CONFIG`, else `~/.parley/config.toml`.
    pub async fn from_default_config(options: RuntimeOptions) -> Result<Self, RuntimeError> {
        let source = TomlConfigSource::load_default()?;
        Self::from_source(source, options).await
    }

    pub async fn with_transport(
        config: Arc<ProviderConfig>,
        transport: Arc<dyn ChatTransport>,
        options: RuntimeOptions,
    ) -> Result<Self, RuntimeError> {
        let store = create_history_store(options.history)?;
        let history = Arc::new(HistoryManager::open(store).await?);

        let (provider_hooks, tool_hooks) = observability_hooks(options.observability);
        let mut tools = ToolExecutionManager::new().with_hooks(tool_hooks);
        if let Some(timeout) = options.tool_timeout {
            tools = tools.with_timeout(timeout);
        }

        let mut builder = ChatOrchestrator::builder(Arc::clone(&config), Arc::clone(&transport))
            .history(Arc::clone(&history))
            .tool_manager(tools)
            .policy(options.policy)
            .provider_hooks(provider_hooks);
        if let Some(sink) = options.stream_sink {
            builder = builder.stream_sink(sink);
        }
        let orchestrator = builder.build();

        tracing::info!(
            phase = "runtime",
            event = "ready",
            provider = %config.provider_name,
            model = %config.primary_model(),
            history_entries = history.history_count(),
            observability = ?options.observability,
            "runtime ready"
        );

        Ok(Self {
            config,
            transport,
            history,
            orchestrator,
        })
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

    pub fn orchestrator(&self) -> &ChatOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut ChatOrchestrator {
        &mut self.orchestrator
    }

    /// A completion client sharing this runtime's transport and policy.
    pub fn completion_client(&self) -> CompletionClient {
        CompletionClient::new(Arc::clone(&self.config), Arc::clone(&self.transport))
            .with_policy(self.orchestrator.policy().clone())
    }

    pub async fn invoke(&self, params: OrchestrationParams) -> Result<String, ChatError> {
        self.orchestrator.invoke(params).await
    }

    pub async fn invoke_stream(&self, params: OrchestrationParams) -> Result<String, ChatError> {
        self.orchestrator.invoke_stream(params).await
    }

    pub async fn save_history(&self) -> Result<(), HistoryError> {
        self.history.save_history().await
    }
}

impl std::fmt::Debug for ParleyRuntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyRuntime")
            .field("provider", &self.config.provider_name)
            .field("transport", &self.transport.provider_name())
            .field("history_entries", &self.history.history_count())
            .finish_non_exhaustive()
    }
}

fn observability_hooks(
    observability: Observability,
) -> (Arc<dyn ProviderOperationHooks>, Arc<dyn ToolRuntimeHooks>) {
    match observability {
        Observability::Disabled => (
            Arc::new(pprovider::NoopOperationHooks),
            Arc::new(ptooling::NoopToolRuntimeHooks),
        ),
        Observability::Tracing => (
            Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)),
            Arc::new(SafeToolHooks::new(TracingObservabilityHooks)),
        ),
        Observability::Metrics => (
            Arc::new(SafeProviderHooks::new(MetricsObservabilityHooks)),
            Arc::new(SafeToolHooks::new(MetricsObservabilityHooks)),
        ),
    }
}

#[cfg(feature = "provider-openai")]
fn default_transport(config: Arc<ProviderConfig>) -> Result<Arc<dyn ChatTransport>, RuntimeError> {
    Ok(Arc::new(pprovider::OpenAiChatTransport::new(config)))
}

#[cfg(not(feature = "provider-openai"))]
fn default_transport(_config: Arc<ProviderConfig>) -> Result<Arc<dyn ChatTransport>, RuntimeError> {
    Err(RuntimeError::unsupported(
        "provider-openai feature is not enabled on parley",
    ))
}
