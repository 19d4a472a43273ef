//! Chat-layer errors.
//!
//! A fatal provider failure keeps the original [`ProviderError`] untouched so
//! callers can inspect its kind, status and detail.

use std::error::Error;
use std::fmt::{Display, Formatter};

use phistory::HistoryError;
use pprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    History,
    Cancelled,
    RoundLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub provider: Option<ProviderError>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn history(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::History, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    pub fn round_limit(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::RoundLimit, message)
    }

    /// Wraps a fatal provider error with a chat-level explanation.
    pub fn provider(error: ProviderError, message: impl Into<String>) -> Self {
        Self {
            kind: ChatErrorKind::Provider,
            message: message.into(),
            provider: Some(error),
        }
    }

    pub fn provider_error(&self) -> Option<&ProviderError> {
        self.provider.as_ref()
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.provider
            .as_ref()
            .map(|error| error as &(dyn Error + 'static))
    }
}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let message = value.message.clone();
        Self::provider(value, message)
    }
}

impl From<HistoryError> for ChatError {
    fn from(value: HistoryError) -> Self {
        Self::history(value.to_string())
    }
}
