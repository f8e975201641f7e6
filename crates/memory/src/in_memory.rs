//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use diabecare_core::error::MemoryError;
use diabecare_core::memory::{MemoryStore, Recall, RecallStatus, keep_recent};
use diabecare_core::message::ChatTurn;
use tokio::sync::RwLock;

/// An in-memory store that keeps the history in a Vec.
///
/// `None` means nothing has been saved (or it was cleared), mirroring an
/// absent history file.
pub struct InMemoryStore {
    max_turns: usize,
    turns: RwLock<Option<Vec<ChatTurn>>>,
}

impl InMemoryStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            turns: RwLock::new(None),
        }
    }

    /// Start with `turns` already stored (not truncated).
    pub fn with_turns(max_turns: usize, turns: Vec<ChatTurn>) -> Self {
        Self {
            max_turns,
            turns: RwLock::new(Some(turns)),
        }
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }

    async fn load(&self) -> Recall {
        match self.turns.read().await.as_ref() {
            Some(turns) => Recall::loaded(turns.clone()),
            None => Recall::empty(RecallStatus::Missing),
        }
    }

    async fn save(&self, turns: Vec<ChatTurn>) -> Result<usize, MemoryError> {
        let kept = keep_recent(turns, self.max_turns);
        let count = kept.len();
        *self.turns.write().await = Some(kept);
        Ok(count)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        *self.turns.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_missing() {
        let mem = InMemoryStore::new(10);
        assert_eq!(mem.load().await.status, RecallStatus::Missing);
    }

    #[tokio::test]
    async fn save_truncates_to_max_turns() {
        let mem = InMemoryStore::new(4);
        let turns: Vec<ChatTurn> = (0..6).map(|i| ChatTurn::user(i.to_string())).collect();

        assert_eq!(mem.save(turns).await.unwrap(), 4);

        let loaded = mem.load().await.into_turns();
        let contents: Vec<&str> = loaded.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn clear_resets_to_missing() {
        let mem = InMemoryStore::with_turns(10, vec![ChatTurn::user("hi")]);
        mem.clear().await.unwrap();
        let recall = mem.load().await;
        assert!(recall.turns.is_empty());
        assert_eq!(recall.status, RecallStatus::Missing);
    }
}
