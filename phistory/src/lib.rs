//! Conversation history for the parley runtime.
//!
//! [`HistoryManager`] keeps the ordered log of exchanged messages in memory
//! and flushes it to a [`HistoryStore`] on demand. Stores are provided for
//! tests ([`InMemoryHistoryStore`]), single-file persistence
//! ([`JsonFileHistoryStore`]) and SQLite ([`SqliteHistoryStore`]).
//!
//! ```rust
//! use pprovider::Message;
//! use phistory::HistoryManager;
//!
//! let history = HistoryManager::in_memory();
//! history.add_entry(Message::user("hello"));
//! history.add_entry(Message::assistant("hi"));
//!
//! assert_eq!(history.history_count(), 2);
//! assert_eq!(history.get_chat_history(1), vec![Message::assistant("hi")]);
//! ```

mod error;
mod manager;
mod persisted;
mod store;
mod stores;

pub mod prelude {
    pub use crate::{
        HistoryEntry, HistoryError, HistoryErrorKind, HistoryManager, HistoryStore,
        HistoryStoreConfig, InMemoryHistoryStore, JsonFileHistoryStore, SqliteHistoryStore,
        create_history_store, default_history_path,
    };
}

pub use error::{HistoryError, HistoryErrorKind};
pub use manager::{HistoryEntry, HistoryManager};
pub use store::{
    HISTORY_PATH_ENV, HistoryStore, HistoryStoreConfig, InMemoryHistoryStore,
    create_history_store, default_history_path,
};
pub use stores::{JsonFileHistoryStore, SqliteHistoryStore};
