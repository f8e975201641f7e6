//! Memory trait — the bounded recent-history store.
//!
//! The store holds an ordered list of [`ChatTurn`]s capped at `max_turns`.
//! Every `save` keeps only the newest `max_turns` entries (FIFO eviction).
//!
//! Loading never fails: a missing or damaged store reads as empty, and the
//! [`RecallStatus`] says which of those happened.

use crate::error::MemoryError;
use crate::message::ChatTurn;
use async_trait::async_trait;

/// Why a recall produced the turns it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecallStatus {
    /// Storage was read and decoded.
    Loaded,
    /// Nothing has been stored yet (or it was cleared).
    Missing,
    /// Storage exists but could not be decoded.
    Corrupt(String),
    /// Storage exists but could not be read.
    Unreadable(String),
}

/// The result of reading the history store.
#[derive(Debug, Clone)]
pub struct Recall {
    pub turns: Vec<ChatTurn>,
    pub status: RecallStatus,
}

impl Recall {
    pub fn loaded(turns: Vec<ChatTurn>) -> Self {
        Self {
            turns,
            status: RecallStatus::Loaded,
        }
    }

    /// An empty recall with the given reason.
    pub fn empty(status: RecallStatus) -> Self {
        Self {
            turns: Vec::new(),
            status,
        }
    }

    /// True when the store was damaged rather than simply absent.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.status,
            RecallStatus::Corrupt(_) | RecallStatus::Unreadable(_)
        )
    }

    pub fn into_turns(self) -> Vec<ChatTurn> {
        self.turns
    }
}

/// Keep the newest `max` turns, preserving order.
pub fn keep_recent(mut turns: Vec<ChatTurn>, max: usize) -> Vec<ChatTurn> {
    if turns.len() > max {
        turns.drain(..turns.len() - max);
    }
    turns
}

/// The core MemoryStore trait.
///
/// Implementations: JSON file (production), in-memory (tests, ephemeral).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// The maximum number of turns retained after a save.
    fn max_turns(&self) -> usize;

    /// Read the stored history. Never fails.
    async fn load(&self) -> Recall;

    /// Replace the stored history with the newest `max_turns` of `turns`.
    ///
    /// Returns how many turns were written.
    async fn save(&self, turns: Vec<ChatTurn>) -> std::result::Result<usize, MemoryError>;

    /// Remove the stored history. Succeeds when nothing is stored.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;
}
