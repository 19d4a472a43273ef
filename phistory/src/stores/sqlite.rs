//! SQLite store keeping one ordered row per history entry.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use pcommon::BoxFuture;
use pprovider::Message;
use rusqlite::{Connection, params};

use crate::HistoryError;
use crate::persisted::PersistedMessage;
use crate::store::HistoryStore;

#[derive(Debug)]
pub struct SqliteHistoryStore {
    connection: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                HistoryError::storage(format!("failed to create sqlite parent directory: {error}"))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            HistoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, HistoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            HistoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, HistoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                HistoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.connection
            .lock()
            .map_err(|_| HistoryError::storage("sqlite history store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), HistoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS history_entries (
                sequence INTEGER PRIMARY KEY,
                role TEXT NOT NULL,
                payload_json TEXT NOT NULL
            );
            ",
        )
        .map_err(|error| {
            HistoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    fn read(&self) -> Result<Vec<Message>, HistoryError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT payload_json FROM history_entries ORDER BY sequence ASC")
            .map_err(|error| {
                HistoryError::storage(format!("failed to prepare history query: {error}"))
            })?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|error| {
                HistoryError::storage(format!("failed to query history rows: {error}"))
            })?;

        let mut messages = Vec::new();
        for row in rows {
            let payload = row.map_err(|error| {
                HistoryError::storage(format!("failed to read history row: {error}"))
            })?;
            messages.push(serde_json::from_str::<PersistedMessage>(&payload)?.into_message()?);
        }
        Ok(messages)
    }

    fn write(&self, messages: &[Message]) -> Result<(), HistoryError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM history_entries", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO history_entries (sequence, role, payload_json) VALUES (?1, ?2, ?3)",
            )?;
            for (sequence, message) in messages.iter().enumerate() {
                let payload = serde_json::to_string(&PersistedMessage::from_message(message))?;
                insert.execute(params![sequence as i64, message.role.as_str(), payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Message>, HistoryError>> {
        Box::pin(async move { self.read() })
    }

    fn save<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move { self.write(messages) })
    }
}

#[cfg(test)]
mod tests {
    use pprovider::ToolCallRef;

    use super::*;

    #[tokio::test]
    async fn rewrite_keeps_order_and_tool_fields() {
        let store = SqliteHistoryStore::new_in_memory().expect("sqlite store should open");
        let messages = vec![
            Message::system("be brief"),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCallRef::function("call_1", "lookup", "{\"id\":1}")],
            ),
            Message::tool_result("call_1", "lookup", "found"),
        ];

        store.save(&messages).await.expect("save should work");
        store.save(&messages[1..]).await.expect("rewrite should work");

        let loaded = store.load().await.expect("load should work");
        assert_eq!(loaded, messages[1..].to_vec());
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("phistory-sqlite-{unique}"));
        let path = root.join("history.sqlite3");

        {
            let store = SqliteHistoryStore::new(&path).expect("store should open");
            store
                .save(&[Message::user("hello"), Message::assistant("hi")])
                .await
                .expect("save should work");
        }

        let reopened = SqliteHistoryStore::new(&path).expect("store should reopen");
        let loaded = reopened.load().await.expect("load should work");
        assert_eq!(loaded, vec![Message::user("hello"), Message::assistant("hi")]);

        drop(reopened);
        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }
}
