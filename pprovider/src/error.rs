//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::{ErrorDetail, ProviderError, ProviderErrorKind};
//!
//! let auth = ProviderError::authentication("bad key");
//! assert!(!auth.retryable);
//!
//! let limited = ProviderError::completion_token_limit("too many tokens", 4096);
//! assert_eq!(limited.kind, ProviderErrorKind::CompletionTokenLimit);
//! assert_eq!(limited.detail, Some(ErrorDetail::TokenLimit(4096)));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    ToolsUnsupported,
    CompletionTokenLimit,
    ContextWindowExceeded,
    FixedTemperature,
    UnsupportedParameter,
    Timeout,
    Transport,
    Unavailable,
    Other,
}

/// Payload extracted from a classified provider error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    TokenLimit(u32),
    Temperature(f32),
    Parameter(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
    pub status: Option<u16>,
    pub detail: Option<ErrorDetail>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            status: None,
            detail: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn tools_unsupported(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ToolsUnsupported, message, false)
    }

    pub fn completion_token_limit(message: impl Into<String>, limit: u32) -> Self {
        Self::new(ProviderErrorKind::CompletionTokenLimit, message, false)
            .with_detail(ErrorDetail::TokenLimit(limit))
    }

    pub fn context_window_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ContextWindowExceeded, message, false)
    }

    pub fn fixed_temperature(message: impl Into<String>, temperature: f32) -> Self {
        Self::new(ProviderErrorKind::FixedTemperature, message, false)
            .with_detail(ErrorDetail::Temperature(temperature))
    }

    pub fn unsupported_parameter(message: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::UnsupportedParameter, message, false)
            .with_detail(ErrorDetail::Parameter(parameter.into()))
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn token_limit(&self) -> Option<u32> {
        match self.detail {
            Some(ErrorDetail::TokenLimit(limit)) => Some(limit),
            _ => None,
        }
    }

    pub fn required_temperature(&self) -> Option<f32> {
        match self.detail {
            Some(ErrorDetail::Temperature(value)) => Some(value),
            _ => None,
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        match &self.detail {
            Some(ErrorDetail::Parameter(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{:?} ({status}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ProviderError {}
