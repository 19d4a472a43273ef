//! History store contract, the in-memory store and store selection.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pcommon::BoxFuture;
use pprovider::Message;

use crate::HistoryError;
use crate::stores::{JsonFileHistoryStore, SqliteHistoryStore};

pub const HISTORY_PATH_ENV: &str = "PARLEY_HISTORY_PATH";

/// Durable backing for a [`HistoryManager`](crate::HistoryManager).
///
/// A store is read in full once, when the manager opens, and rewritten in
/// full on every explicit save.
pub trait HistoryStore: Send + Sync {
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Message>, HistoryError>>;

    fn save<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<(), HistoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStoreConfig {
    JsonFile { path: PathBuf },
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for HistoryStoreConfig {
    fn default() -> Self {
        Self::JsonFile {
            path: default_history_path(),
        }
    }
}

pub fn create_history_store(
    config: HistoryStoreConfig,
) -> Result<Arc<dyn HistoryStore>, HistoryError> {
    match config {
        HistoryStoreConfig::JsonFile { path } => Ok(Arc::new(JsonFileHistoryStore::new(path))),
        HistoryStoreConfig::Sqlite { path } => Ok(Arc::new(SqliteHistoryStore::new(path)?)),
        HistoryStoreConfig::InMemory => Ok(Arc::new(InMemoryHistoryStore::new())),
    }
}

/// `$PARLEY_HISTORY_PATH`, else `~/.parley/history.json`.
pub fn default_history_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os(HISTORY_PATH_ENV) {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".parley").join("history.json");
    }

    PathBuf::from("parley-history.json")
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }

    /// What the last save wrote.
    pub fn snapshot(&self) -> Result<Vec<Message>, HistoryError> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .map_err(|_| HistoryError::storage("in-memory history store lock poisoned"))
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Message>, HistoryError>> {
        Box::pin(async move { self.snapshot() })
    }

    fn save<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let mut stored = self
                .messages
                .lock()
                .map_err(|_| HistoryError::storage("in-memory history store lock poisoned"))?;
            *stored = messages.to_vec();
            Ok(())
        })
    }
}
