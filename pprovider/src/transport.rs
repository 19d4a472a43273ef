//! Transport contract between the orchestrator and a provider endpoint.

use std::future::Future;
use std::pin::Pin;

use crate::{BoxedChunkStream, ChatRequest, ChatResponse, ProviderError};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends normalized requests to one provider.
///
/// Implementations return provider failures already classified into
/// [`ProviderErrorKind`](crate::ProviderErrorKind); they never retry or
/// rewrite requests themselves.
pub trait ChatTransport: Send + Sync {
    fn provider_name(&self) -> &str;

    fn execute_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>>;

    fn stream_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>>;

    /// Model ids in fallback order: `preferred` first when configured.
    fn available_models(&self, preferred: Option<&str>) -> Vec<String>;
}
