//! Append-only conversation log backed by a [`HistoryStore`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pprovider::Message;

use crate::{HistoryError, HistoryStore, InMemoryHistoryStore};

/// A recorded message and its insertion position.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub sequence: u64,
    pub message: Message,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: Vec<HistoryEntry>,
    next_sequence: u64,
}

impl HistoryState {
    fn push(&mut self, message: Message) {
        self.entries.push(HistoryEntry {
            sequence: self.next_sequence,
            message,
        });
        self.next_sequence += 1;
    }
}

/// Records every exchanged message for one conversation.
///
/// Entries are appended and never edited. Nothing reaches the store until
/// [`save_history`](Self::save_history) is called.
pub struct HistoryManager {
    store: Arc<dyn HistoryStore>,
    state: Mutex<HistoryState>,
}

impl HistoryManager {
    /// Reads the whole store and starts recording after its last entry.
    pub async fn open(store: Arc<dyn HistoryStore>) -> Result<Self, HistoryError> {
        let messages = store.load().await?;
        tracing::info!(
            phase = "history",
            event = "opened",
            entries = messages.len(),
            "loaded conversation history"
        );

        let mut state = HistoryState::default();
        for message in messages {
            state.push(message);
        }

        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    /// Empty manager over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryHistoryStore::new()),
            state: Mutex::new(HistoryState::default()),
        }
    }

    pub fn store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.store)
    }

    pub fn add_entry(&self, message: Message) {
        self.state().push(message);
    }

    /// The last `count` messages, oldest first.
    pub fn get_chat_history(&self, count: usize) -> Vec<Message> {
        self.recent_entries(count)
            .into_iter()
            .map(|entry| entry.message)
            .collect()
    }

    pub fn recent_entries(&self, count: usize) -> Vec<HistoryEntry> {
        let state = self.state();
        let start = state.entries.len().saturating_sub(count);
        state.entries[start..].to_vec()
    }

    pub fn history_count(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history_count() == 0
    }

    pub fn clear_history(&self) {
        let mut state = self.state();
        let cleared = state.entries.len();
        state.entries.clear();
        tracing::debug!(phase = "history", event = "cleared", cleared, "cleared history");
    }

    /// Writes every current entry to the store.
    pub async fn save_history(&self) -> Result<(), HistoryError> {
        let messages = self
            .state()
            .entries
            .iter()
            .map(|entry| entry.message.clone())
            .collect::<Vec<_>>();

        self.store.save(&messages).await.inspect_err(|error| {
            tracing::error!(
                phase = "history",
                event = "save_failed",
                error_kind = ?error.kind,
                error = %error.message,
                "failed to save history"
            );
        })?;
        tracing::debug!(
            phase = "history",
            event = "saved",
            entries = messages.len(),
            "saved history"
        );
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("entries", &self.history_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_chat_history_returns_newest_entries_oldest_first() {
        let history = HistoryManager::in_memory();
        for text in ["one", "two", "three", "four"] {
            history.add_entry(Message::user(text));
        }

        assert_eq!(
            history.get_chat_history(2),
            vec![Message::user("three"), Message::user("four")]
        );
        assert_eq!(history.get_chat_history(10).len(), 4);
        assert!(history.get_chat_history(0).is_empty());
    }

    #[test]
    fn sequences_keep_growing_after_clear() {
        let history = HistoryManager::in_memory();
        history.add_entry(Message::user("a"));
        history.add_entry(Message::user("b"));
        history.clear_history();
        assert!(history.is_empty());

        history.add_entry(Message::user("c"));
        let entries = history.recent_entries(5);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sequence, 2);
    }

    #[test]
    fn recording_continues_after_a_panic_while_locked() {
        let history = HistoryManager::in_memory();
        history.add_entry(Message::user("before"));

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = history.state.lock().expect("state lock");
            panic!("panicked while recording");
        }));
        assert!(poisoned.is_err());
        assert!(history.state.is_poisoned());

        history.add_entry(Message::user("after"));
        assert_eq!(
            history.get_chat_history(5),
            vec![Message::user("before"), Message::user("after")]
        );
    }
}
