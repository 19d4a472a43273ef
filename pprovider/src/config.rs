//! Provider connection settings and the adapter that loads them.
//!
//! Values come from a [`ConfigSource`], a read-only view of sections and
//! keys. [`TomlConfigSource`] reads a TOML document; [`MapConfigSource`] is
//! filled in code.
//!
//! ```rust
//! use pprovider::{ConfigAdapter, MapConfigSource};
//!
//! let source = MapConfigSource::new()
//!     .set("llm", "api_key", "sk-test")
//!     .set("llm", "models", vec!["gpt-4o-mini", "gpt-4o"]);
//!
//! let config = ConfigAdapter::new(source)
//!     .load_provider_config(None)
//!     .expect("config should load");
//!
//! assert_eq!(config.primary_model(), "gpt-4o-mini");
//! assert_eq!(config.max_completion_tokens, 150_000);
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::{ProviderCredential, SecretString};

pub const DEFAULT_PROVIDER_NAME: &str = "default";
pub const DEFAULT_PROVIDER_KEY: &str = "llm";
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 150_000;
pub const DEFAULT_APPLICATION_NAME: &str = "parley";
pub const CONFIG_PATH_ENV: &str = "PARLEY_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Missing,
    Invalid,
    Io,
    Parse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Missing, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Io, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Integer(value) => u32::try_from(*value).ok(),
            Self::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            Self::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// A single string counts as a one-element list.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(values) => Some(values.clone()),
            Self::String(value) => Some(vec![value.clone()]),
            _ => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Read-only configuration collaborator.
pub trait ConfigSource: Send + Sync {
    fn value(&self, section: &str, key: &str) -> Option<ConfigValue>;
}

#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<(String, String), ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Self {
        self.values
            .insert((section.into(), key.into()), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn value(&self, section: &str, key: &str) -> Option<ConfigValue> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TomlConfigSource {
    table: toml::Table,
}

impl TomlConfigSource {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table = text
            .parse::<toml::Table>()
            .map_err(|error| ConfigError::parse(format!("invalid TOML configuration: {error}")))?;
        Ok(Self { table })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| {
            ConfigError::io(format!(
                "failed to read configuration file '{}': {error}",
                path.display()
            ))
        })?;
        let source = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration file");
        Ok(source)
    }

    /// Loads the default file, falling back to an empty source when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_path(path),
            Some(path) => {
                tracing::warn!(path = %path.display(), "configuration file not found, using empty configuration");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

impl ConfigSource for TomlConfigSource {
    fn value(&self, section: &str, key: &str) -> Option<ConfigValue> {
        let value = self.table.get(section)?.as_table()?.get(key)?;
        toml_to_config_value(value)
    }
}

fn toml_to_config_value(value: &toml::Value) -> Option<ConfigValue> {
    match value {
        toml::Value::String(text) => Some(ConfigValue::String(text.clone())),
        toml::Value::Integer(number) => Some(ConfigValue::Integer(*number)),
        toml::Value::Float(number) => Some(ConfigValue::Float(*number)),
        toml::Value::Boolean(flag) => Some(ConfigValue::Bool(*flag)),
        toml::Value::Array(items) => Some(ConfigValue::List(
            items
                .iter()
                .map(|item| match item {
                    toml::Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        _ => None,
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".parley").join("config.toml"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub read: Duration,
    pub connect: Duration,
    pub write: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(180),
            connect: Duration::from_secs(5),
            write: Duration::from_secs(5),
        }
    }
}

/// Wire name used for the completion-token ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenParameter {
    MaxTokens,
    #[default]
    MaxCompletionTokens,
}

impl TokenParameter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "max_tokens" => Some(Self::MaxTokens),
            "max_completion_tokens" => Some(Self::MaxCompletionTokens),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub provider_key: String,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub models: Vec<String>,
    pub max_completion_tokens: u32,
    pub token_parameter: TokenParameter,
    pub application_name: String,
    pub timeout: TimeoutConfig,
}

impl ProviderConfig {
    /// Minimal API-key configuration, mostly for tests and embedding.
    pub fn with_api_key(api_key: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_key: DEFAULT_PROVIDER_KEY.to_string(),
            base_url: None,
            api_key: Some(SecretString::new(api_key)),
            client_id: None,
            client_secret: None,
            models,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
            token_parameter: TokenParameter::default(),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            timeout: TimeoutConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn primary_model(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or_default()
    }

    /// Yields `preferred` first when it is configured, then every other model once.
    pub fn iter_models<'a>(&'a self, preferred: Option<&'a str>) -> impl Iterator<Item = &'a str> {
        let preferred = preferred.filter(|model| self.models.iter().any(|item| item == model));
        preferred.into_iter().chain(
            self.models
                .iter()
                .map(String::as_str)
                .filter(move |model| Some(*model) != preferred),
        )
    }

    pub fn credential(&self) -> Option<ProviderCredential> {
        if let Some(api_key) = self.api_key.as_ref().filter(|key| !key.is_empty()) {
            return Some(ProviderCredential::ApiKey(api_key.clone()));
        }

        match (&self.client_id, &self.client_secret) {
            (Some(client_id), Some(client_secret)) => Some(ProviderCredential::ClientCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        }
    }

    /// Client-credential headers; empty unless both id and secret are set.
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Vec::new();
        };

        let mut headers = vec![
            ("Client-Id".to_string(), client_id.clone()),
            ("Client-Secret".to_string(), client_secret.expose().to_string()),
            ("Application-Name".to_string(), self.application_name.clone()),
        ];
        if let Some(username) = current_username() {
            headers.push(("Username".to_string(), username));
        }
        headers
    }
}

fn current_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.trim().is_empty())
}

#[derive(Clone)]
pub struct ConfigAdapter {
    source: Arc<dyn ConfigSource>,
}

impl ConfigAdapter {
    pub fn new<S>(source: S) -> Self
    where
        S: ConfigSource + 'static,
    {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_shared(source: Arc<dyn ConfigSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> Arc<dyn ConfigSource> {
        Arc::clone(&self.source)
    }

    pub fn load_provider_config(
        &self,
        provider_name: Option<&str>,
    ) -> Result<ProviderConfig, ConfigError> {
        let provider_name = match provider_name {
            Some(name) => name.to_string(),
            None => self
                .string(DEFAULT_PROVIDER_KEY, "provider")
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
        };
        let provider_key = if provider_name == DEFAULT_PROVIDER_NAME {
            DEFAULT_PROVIDER_KEY.to_string()
        } else {
            provider_name.clone()
        };

        let base_url = self.string(&provider_key, "base_url");
        let api_key = self.string(&provider_key, "api_key");
        let client_id = self.string(&provider_key, "client_id");
        let client_secret = self.string(&provider_key, "client_secret");
        let models = self.models(&provider_key)?;
        let max_completion_tokens = match self.source.value(&provider_key, "max_completion_tokens") {
            Some(value) => value.as_u32().filter(|limit| *limit > 0).ok_or_else(|| {
                ConfigError::invalid(format!(
                    "[{provider_key}] max_completion_tokens must be a positive integer"
                ))
            })?,
            None => DEFAULT_MAX_COMPLETION_TOKENS,
        };
        let token_parameter = match self.string(&provider_key, "token_parameter") {
            Some(value) => TokenParameter::parse(&value).ok_or_else(|| {
                ConfigError::invalid(format!(
                    "[{provider_key}] token_parameter must be 'max_tokens' or 'max_completion_tokens'"
                ))
            })?,
            None => TokenParameter::default(),
        };
        let application_name = self
            .string(&provider_key, "application_name")
            .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());
        let defaults = TimeoutConfig::default();
        let timeout = TimeoutConfig {
            read: self.seconds("read_timeout", defaults.read)?,
            connect: self.seconds("connect_timeout", defaults.connect)?,
            write: self.seconds("write_timeout", defaults.write)?,
        };

        validate_credentials(
            &provider_name,
            &provider_key,
            base_url.as_deref(),
            api_key.as_deref(),
            client_id.as_deref(),
            client_secret.as_deref(),
        )?;

        tracing::debug!(
            provider = %provider_name,
            provider_key = %provider_key,
            models = models.len(),
            "loaded provider configuration"
        );

        Ok(ProviderConfig {
            provider_name,
            provider_key,
            base_url,
            api_key: api_key.map(SecretString::new),
            client_id,
            client_secret: client_secret.map(SecretString::new),
            models,
            max_completion_tokens,
            token_parameter,
            application_name,
            timeout,
        })
    }

    fn string(&self, section: &str, key: &str) -> Option<String> {
        self.source
            .value(section, key)
            .and_then(|value| value.as_str().map(ToString::to_string))
            .filter(|value| !value.trim().is_empty())
    }

    fn models(&self, provider_key: &str) -> Result<Vec<String>, ConfigError> {
        let models = self
            .source
            .value(provider_key, "models")
            .and_then(|value| value.as_list())
            .unwrap_or_default()
            .into_iter()
            .filter(|model| !model.trim().is_empty())
            .collect::<Vec<_>>();

        if models.is_empty() {
            return Err(ConfigError::missing(format!(
                "please configure models in the [{provider_key}] section"
            )));
        }
        Ok(models)
    }

    fn seconds(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let Some(value) = self.source.value(DEFAULT_PROVIDER_KEY, key) else {
            return Ok(default);
        };
        value
            .as_f64()
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(Duration::from_secs_f64)
            .ok_or_else(|| {
                ConfigError::invalid(format!(
                    "[{DEFAULT_PROVIDER_KEY}] {key} must be a positive number of seconds"
                ))
            })
    }
}

fn validate_credentials(
    provider_name: &str,
    provider_key: &str,
    base_url: Option<&str>,
    api_key: Option<&str>,
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Result<(), ConfigError> {
    if provider_name == "openai" {
        return match api_key {
            Some(_) => Ok(()),
            None => Err(ConfigError::missing(format!(
                "please configure api_key in the [{provider_key}] section"
            ))),
        };
    }

    if provider_name != DEFAULT_PROVIDER_NAME && base_url.is_none() {
        return Err(ConfigError::missing(format!(
            "please configure base_url in the [{provider_key}] section"
        )));
    }

    if api_key.is_some() {
        return Ok(());
    }

    if client_id.is_none() {
        return Err(ConfigError::missing(format!(
            "please configure api_key or client_id in the [{provider_key}] section"
        )));
    }
    if client_secret.is_none() {
        return Err(ConfigError::missing(format!(
            "please configure client_secret in the [{provider_key}] section"
        )));
    }

    Ok(())
}
