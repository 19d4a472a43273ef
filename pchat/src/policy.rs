//! Runtime limits applied by the orchestrator.

use std::time::Duration;

use pprovider::RetryPolicy;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 64_000;
pub const DEFAULT_MAX_RECOVERY_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPolicy {
    /// Tool rounds allowed per invocation before `RoundLimit` is returned.
    pub max_tool_rounds: usize,
    /// Input budget used when prepending history.
    pub max_input_tokens: usize,
    pub rate_limit_retry: RetryPolicy,
    /// Request rewrites allowed per dispatch.
    pub max_recovery_attempts: usize,
    /// Model prefixes that only accept one sampling temperature.
    pub fixed_temperatures: Vec<(String, f32)>,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            rate_limit_retry: RetryPolicy::rate_limits_only(3)
                .with_initial_backoff(Duration::from_millis(200)),
            max_recovery_attempts: DEFAULT_MAX_RECOVERY_ATTEMPTS,
            fixed_temperatures: vec![("gpt-5".to_string(), 1.0)],
        }
    }
}

impl ChatPolicy {
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_max_input_tokens(mut self, tokens: usize) -> Self {
        self.max_input_tokens = tokens;
        self
    }

    pub fn with_rate_limit_retry(mut self, retry: RetryPolicy) -> Self {
        self.rate_limit_retry = retry;
        self
    }

    pub fn with_fixed_temperature(mut self, model_prefix: impl Into<String>, value: f32) -> Self {
        self.fixed_temperatures.push((model_prefix.into(), value));
        self
    }

    pub fn fixed_temperature_for(&self, model: &str) -> Option<f32> {
        self.fixed_temperatures
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix.as_str()))
            .map(|(_, value)| *value)
    }
}
