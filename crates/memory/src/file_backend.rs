//! File-based history store — a single pretty-printed JSON array.
//!
//! Storage location defaults to `./chat_memory.json`. The file holds the
//! newest `max_turns` chat turns, oldest first:
//!
//! ```json
//! [
//!   { "role": "user", "content": "Is 180 mg/dL after lunch high?" },
//!   { "role": "assistant", "content": "..." }
//! ]
//! ```
//!
//! The file is read on every `load` and rewritten on every `save`; there is
//! no in-process cache and no locking, so concurrent writers race and the
//! last one wins.

use async_trait::async_trait;
use diabecare_core::error::MemoryError;
use diabecare_core::memory::{MemoryStore, Recall, RecallStatus, keep_recent};
use diabecare_core::message::ChatTurn;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file-backed history store.
pub struct FileMemory {
    path: PathBuf,
    max_turns: usize,
}

impl FileMemory {
    /// Create a store at `path` keeping at most `max_turns` turns.
    ///
    /// Nothing is touched on disk until the first `save`.
    pub fn new(path: impl Into<PathBuf>, max_turns: usize) -> Self {
        Self {
            path: path.into(),
            max_turns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(turns: &[ChatTurn]) -> Result<String, MemoryError> {
        serde_json::to_string_pretty(turns).map_err(|e| MemoryError::Encode(e.to_string()))
    }
}

#[async_trait]
impl MemoryStore for FileMemory {
    fn name(&self) -> &str {
        "file"
    }

    fn max_turns(&self) -> usize {
        self.max_turns
    }

    async fn load(&self) -> Recall {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Recall::empty(RecallStatus::Missing);
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History file unreadable, starting empty"
                );
                return Recall::empty(RecallStatus::Unreadable(e.to_string()));
            }
        };

        match serde_json::from_str::<Vec<ChatTurn>>(&content) {
            Ok(turns) => {
                debug!(path = %self.path.display(), count = turns.len(), "History loaded");
                Recall::loaded(turns)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History file corrupted, starting empty"
                );
                Recall::empty(RecallStatus::Corrupt(e.to_string()))
            }
        }
    }

    async fn save(&self, turns: Vec<ChatTurn>) -> Result<usize, MemoryError> {
        let kept = keep_recent(turns, self.max_turns);
        let content = Self::encode(&kept)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write history file: {e}")))?;

        debug!(path = %self.path.display(), count = kept.len(), "History saved");
        Ok(kept.len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "History cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to remove history file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diabecare_core::message::Role;
    use tempfile::TempDir;

    fn store(dir: &TempDir, max_turns: usize) -> FileMemory {
        FileMemory::new(dir.path().join("chat_memory.json"), max_turns)
    }

    fn exchange(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::user(format!("question {i}"))
                } else {
                    ChatTurn::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn save_and_load_persists() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);

        assert_eq!(mem.save(exchange(4)).await.unwrap(), 4);

        let recall = FileMemory::new(mem.path(), 10).load().await;
        assert_eq!(recall.status, RecallStatus::Loaded);
        assert_eq!(recall.turns, exchange(4));
    }

    #[tokio::test]
    async fn save_keeps_only_newest_turns() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);

        assert_eq!(mem.save(exchange(13)).await.unwrap(), 10);

        let turns = mem.load().await.into_turns();
        assert_eq!(turns.len(), 10);
        assert_eq!(turns, exchange(13)[3..].to_vec());
    }

    #[tokio::test]
    async fn file_is_pretty_printed_and_keeps_unicode() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        mem.save(vec![ChatTurn::assistant("⚠️ Check your levels")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(mem.path()).unwrap();
        assert!(content.starts_with("[\n  {"));
        assert!(content.contains("⚠️ Check your levels"));
    }

    #[tokio::test]
    async fn clear_then_load_is_empty() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        mem.save(exchange(2)).await.unwrap();

        mem.clear().await.unwrap();

        assert!(!mem.path().exists());
        let recall = mem.load().await;
        assert!(recall.turns.is_empty());
        assert_eq!(recall.status, RecallStatus::Missing);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        mem.clear().await.unwrap();
        mem.clear().await.unwrap();
        assert!(!mem.path().exists());
    }

    #[tokio::test]
    async fn handles_missing_file_gracefully() {
        let dir = TempDir::new().unwrap();
        let recall = store(&dir, 10).load().await;
        assert!(recall.turns.is_empty());
        assert!(!recall.is_degraded());
    }

    #[tokio::test]
    async fn corrupted_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        std::fs::write(mem.path(), "this is not json").unwrap();

        let recall = mem.load().await;
        assert!(recall.turns.is_empty());
        assert!(matches!(recall.status, RecallStatus::Corrupt(_)));
    }

    #[tokio::test]
    async fn non_array_json_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        std::fs::write(mem.path(), r#"{"role":"user","content":"hi"}"#).unwrap();

        let recall = mem.load().await;
        assert!(recall.turns.is_empty());
        assert!(recall.is_degraded());
    }

    #[tokio::test]
    async fn unknown_roles_are_loaded() {
        let dir = TempDir::new().unwrap();
        let mem = store(&dir, 10);
        std::fs::write(
            mem.path(),
            r#"[{"role":"tool","content":"x"},{"role":"user","content":"hi"}]"#,
        )
        .unwrap();

        let turns = mem.load().await.into_turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::Unknown);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mem = FileMemory::new(dir.path().join("nested/deeper/history.json"), 4);
        mem.save(exchange(2)).await.unwrap();
        assert_eq!(mem.load().await.turns.len(), 2);
    }

    #[tokio::test]
    async fn unwritable_location_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        // The history path is an existing directory, so the write must fail.
        let mem = FileMemory::new(dir.path(), 10);
        let err = mem.save(exchange(2)).await.unwrap_err();
        assert!(matches!(err, MemoryError::Storage(_)));
    }
}
