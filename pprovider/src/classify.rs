//! Maps raw provider failures onto the structured error taxonomy.
//!
//! Transports call [`classify_error`] once, at the boundary, so callers only
//! ever match on [`ProviderErrorKind`] and [`ErrorDetail`](crate::ErrorDetail).
//!
//! ```rust
//! use pprovider::{ProviderError, ProviderErrorKind, classify_error};
//!
//! let raw = ProviderError::invalid_request(
//!     "This model supports at most 4096 completion tokens, whereas you provided 8000.",
//! );
//! let classified = classify_error(raw, None, None);
//!
//! assert_eq!(classified.kind, ProviderErrorKind::CompletionTokenLimit);
//! assert_eq!(classified.token_limit(), Some(4096));
//! ```

use crate::{ErrorDetail, ProviderError, ProviderErrorKind};

/// Refines a status-derived error using the body message plus the optional
/// `param` and `code` fields of an OpenAI-style error envelope.
pub fn classify_error(
    error: ProviderError,
    param: Option<&str>,
    code: Option<&str>,
) -> ProviderError {
    if error.kind == ProviderErrorKind::Authentication {
        return error;
    }

    let Some((kind, detail)) = classify_message(&error.message, param, code) else {
        return error;
    };

    let retryable = kind == ProviderErrorKind::RateLimited;
    ProviderError {
        kind,
        retryable,
        detail,
        ..error
    }
}

pub(crate) fn classify_message(
    message: &str,
    param: Option<&str>,
    code: Option<&str>,
) -> Option<(ProviderErrorKind, Option<ErrorDetail>)> {
    let lowered = message.to_ascii_lowercase();

    if let Some(rejected) = rejected_parameter_list(message) {
        if rejected.iter().any(|name| name == "tools") {
            return Some((ProviderErrorKind::ToolsUnsupported, None));
        }
        if let Some(first) = rejected.into_iter().next() {
            return Some((
                ProviderErrorKind::UnsupportedParameter,
                Some(ErrorDetail::Parameter(first)),
            ));
        }
    }

    if lowered.contains("does not support tools")
        || lowered.contains("tools is not supported")
        || lowered.contains("tool use is not supported")
        || (param == Some("tools") && lowered.contains("not supported"))
    {
        return Some((ProviderErrorKind::ToolsUnsupported, None));
    }

    if let Some(limit) = number_after(message, "exceeds the model limit of")
        .or_else(|| completion_ceiling(&lowered))
    {
        return Some((
            ProviderErrorKind::CompletionTokenLimit,
            Some(ErrorDetail::TokenLimit(limit)),
        ));
    }

    if lowered.contains("input is too long for requested model")
        || lowered.contains("maximum context length")
        || lowered.contains("context window")
        || code == Some("context_length_exceeded")
    {
        return Some((ProviderErrorKind::ContextWindowExceeded, None));
    }

    if let Some(value) = fixed_temperature(message, &lowered, param) {
        return Some((
            ProviderErrorKind::FixedTemperature,
            Some(ErrorDetail::Temperature(value)),
        ));
    }

    let named = quoted_after(message, "unexpected keyword argument")
        .or_else(|| quoted_after(message, "Unsupported parameter:"))
        .or_else(|| quoted_after(message, "Unrecognized request argument supplied:"))
        .or_else(|| {
            (code == Some("unsupported_parameter"))
                .then(|| param.map(ToString::to_string))
                .flatten()
        });
    if let Some(name) = named {
        if name == "tools" {
            return Some((ProviderErrorKind::ToolsUnsupported, None));
        }
        return Some((
            ProviderErrorKind::UnsupportedParameter,
            Some(ErrorDetail::Parameter(name)),
        ));
    }

    if lowered.contains("rate limit") || code == Some("rate_limit_exceeded") {
        return Some((ProviderErrorKind::RateLimited, None));
    }

    None
}

/// Parses `does not support parameters: ['a', 'b']`.
fn rejected_parameter_list(message: &str) -> Option<Vec<String>> {
    let marker = "does not support parameters:";
    let start = message.find(marker)? + marker.len();
    let rest = message[start..].trim_start();
    let rest = rest.strip_prefix('[')?;
    let end = rest.find(']')?;
    let names = rest[..end]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>();
    Some(names)
}

fn completion_ceiling(lowered: &str) -> Option<u32> {
    if !lowered.contains("completion tokens") {
        return None;
    }
    number_after(lowered, "at most")
}

fn fixed_temperature(message: &str, lowered: &str, param: Option<&str>) -> Option<f32> {
    if let Some(start) = lowered.find("only temperature=") {
        let value = leading_number(&message[start + "only temperature=".len()..])?;
        return value.parse().ok();
    }

    let mentions_temperature = param == Some("temperature") || lowered.contains("temperature");
    if mentions_temperature && let Some(start) = lowered.find("only the default (") {
        let value = leading_number(&message[start + "only the default (".len()..])?;
        return value.parse().ok();
    }

    None
}

fn number_after(message: &str, marker: &str) -> Option<u32> {
    let start = message.find(marker)? + marker.len();
    leading_number(&message[start..])?.parse().ok()
}

fn leading_number(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let number = text[..end].trim_end_matches('.');
    (!number.is_empty()).then_some(number)
}

fn quoted_after(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let rest = message[start..].trim_start();
    let rest = rest.trim_start_matches(['\'', '"', '`']);
    let name = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();
    (!name.is_empty()).then_some(name)
}
