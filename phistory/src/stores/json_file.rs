//! JSON document store with atomic replace-on-save.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pcommon::BoxFuture;
use pprovider::Message;

use crate::HistoryError;
use crate::persisted::PersistedDocument;
use crate::store::HistoryStore;

#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<Message>, HistoryError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "history file missing, starting empty");
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path).map_err(|error| {
            HistoryError::storage(format!("failed to read history file: {error}"))
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice::<PersistedDocument>(&bytes)?.into_messages()
    }

    fn write(&self, messages: &[Message]) -> Result<(), HistoryError> {
        let bytes = serde_json::to_vec_pretty(&PersistedDocument::from_messages(messages))?;
        write_atomic(&self.path, &bytes)
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Message>, HistoryError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| HistoryError::storage("history file lock poisoned"))?;
            self.read()
        })
    }

    fn save<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| HistoryError::storage("history file lock poisoned"))?;
            self.write(messages)
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), HistoryError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|error| {
            HistoryError::storage(format!("failed to create history directory: {error}"))
        })?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        HistoryError::storage(format!("failed to write temporary history file: {error}"))
    })?;
    fs::rename(&tmp, path)
        .map_err(|error| HistoryError::storage(format!("failed to finalize history file: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("phistory-{prefix}-{unique}"))
            .join("history.json")
    }

    #[tokio::test]
    async fn missing_and_blank_files_load_as_empty() {
        let path = temp_path("blank");
        let store = JsonFileHistoryStore::new(&path);
        assert!(store.load().await.expect("missing file loads").is_empty());

        fs::create_dir_all(path.parent().expect("parent")).expect("dir should exist");
        fs::write(&path, "  \n").expect("blank file should write");
        assert!(store.load().await.expect("blank file loads").is_empty());

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[tokio::test]
    async fn save_replaces_previous_document_without_leftovers() {
        let path = temp_path("replace");
        let store = JsonFileHistoryStore::new(&path);

        store
            .save(&[Message::user("one"), Message::assistant("two")])
            .await
            .expect("first save");
        store
            .save(&[Message::user("three")])
            .await
            .expect("second save");

        let loaded = store.load().await.expect("load should work");
        assert_eq!(loaded, vec![Message::user("three")]);
        assert!(!path.with_extension("json.tmp").exists());

        let raw = fs::read_to_string(&path).expect("file should exist");
        assert!(raw.contains("\"version\": 1"));

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().expect("parent")).expect("dir should exist");
        fs::write(&path, "{ not json").expect("file should write");

        let error = JsonFileHistoryStore::new(&path)
            .load()
            .await
            .expect_err("corrupt file must fail");
        assert_eq!(error.kind, crate::HistoryErrorKind::Serialization);

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }
}
