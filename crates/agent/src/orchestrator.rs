//! The conversation orchestrator.
//!
//! A chat exchange runs:
//!
//! 1. reject blank input with a canned reply (no history access)
//! 2. load history and build the context window
//! 3. call the completion adapter
//! 4. append the user/assistant pair to the full history and save it
//! 5. return the reply
//!
//! The context window replays at most `max_turns - 2` stored turns, while
//! the store keeps `max_turns`. Stored turns whose role is neither `user`
//! nor `assistant` are skipped after slicing, so the window may be shorter.

use std::sync::Arc;

use diabecare_core::error::MemoryError;
use diabecare_core::memory::MemoryStore;
use diabecare_core::message::ChatTurn;
use diabecare_providers::CompletionClient;
use tracing::{debug, info, warn};

use crate::prompt::{HealthData, analysis_messages, system_prompt};

/// Reply for a message that is empty after trimming.
pub const EMPTY_MESSAGE_REPLY: &str = "Please ask a question about diabetes management.";

/// Build the provider input for one chat exchange.
///
/// `[system] + last (max_turns - 2) of history, user/assistant only + [user_text]`
pub fn context_window(history: &[ChatTurn], max_turns: usize, user_text: &str) -> Vec<ChatTurn> {
    let replay = max_turns.saturating_sub(2);
    let start = history.len().saturating_sub(replay);

    let mut window = Vec::with_capacity(replay + 2);
    window.push(ChatTurn::system(system_prompt()));
    window.extend(
        history[start..]
            .iter()
            .filter(|t| t.role.is_conversational())
            .cloned(),
    );
    window.push(ChatTurn::user(user_text));
    window
}

/// Runs chat exchanges and one-shot analyses.
pub struct ChatOrchestrator {
    completion: Arc<CompletionClient>,
    memory: Arc<dyn MemoryStore>,
}

impl ChatOrchestrator {
    pub fn new(completion: Arc<CompletionClient>, memory: Arc<dyn MemoryStore>) -> Self {
        Self { completion, memory }
    }

    pub fn model(&self) -> &str {
        self.completion.model()
    }

    pub fn max_turns(&self) -> usize {
        self.memory.max_turns()
    }

    /// Run one chat exchange and return the reply.
    ///
    /// Provider failures come back as reply text and are stored like any
    /// other reply. History write failures are logged and ignored.
    pub async fn chat(&self, message: &str) -> String {
        let user_text = message.trim();
        if user_text.is_empty() {
            return EMPTY_MESSAGE_REPLY.to_string();
        }

        let recall = self.memory.load().await;
        if recall.is_degraded() {
            warn!(status = ?recall.status, "Continuing chat with empty history");
        }
        let mut history = recall.into_turns();

        let window = context_window(&history, self.memory.max_turns(), user_text);
        debug!(
            stored = history.len(),
            window = window.len(),
            "Context window assembled"
        );

        let reply = self.completion.complete(window).await;

        history.push(ChatTurn::user(user_text));
        history.push(ChatTurn::assistant(reply.clone()));
        self.persist(history).await;

        info!(
            message_len = user_text.len(),
            reply_len = reply.len(),
            "Chat exchange completed"
        );
        reply
    }

    /// Run a one-shot health analysis. History is neither read nor written.
    pub async fn analyze(&self, data: &HealthData) -> String {
        let reply = self.completion.complete(analysis_messages(data)).await;
        info!(reply_len = reply.len(), "Analysis completed");
        reply
    }

    /// The stored history, oldest first.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.memory.load().await.into_turns()
    }

    /// Remove the stored history.
    pub async fn clear_history(&self) -> Result<(), MemoryError> {
        self.memory.clear().await?;
        info!(backend = %self.memory.name(), "Chat history cleared");
        Ok(())
    }

    async fn persist(&self, history: Vec<ChatTurn>) {
        match self.memory.save(history).await {
            Ok(count) => debug!(count, "History persisted"),
            Err(e) => warn!(error = %e, "Failed to persist chat history"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use diabecare_core::error::ProviderError;
    use diabecare_core::memory::Recall;
    use diabecare_core::message::Role;
    use diabecare_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use diabecare_memory::{FileMemory, InMemoryStore};
    use diabecare_providers::completion::RATE_LIMIT_REPLY;
    use std::sync::Mutex;

    /// Answers every call with `reply` and records what it was sent.
    struct RecordingProvider {
        reply: Result<String, ProviderError>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_messages(&self) -> Vec<ChatTurn> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .map(|r| r.messages.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let model = request.model.clone();
            self.requests.lock().unwrap().push(request);
            self.reply.clone().map(|content| ProviderResponse {
                content,
                usage: None,
                model,
            })
        }
    }

    /// A store whose writes always fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl MemoryStore for ReadOnlyStore {
        fn name(&self) -> &str {
            "read_only"
        }

        fn max_turns(&self) -> usize {
            10
        }

        async fn load(&self) -> Recall {
            Recall::loaded(vec![ChatTurn::user("earlier"), ChatTurn::assistant("reply")])
        }

        async fn save(&self, _turns: Vec<ChatTurn>) -> Result<usize, MemoryError> {
            Err(MemoryError::Storage("read-only filesystem".into()))
        }

        async fn clear(&self) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("read-only filesystem".into()))
        }
    }

    fn orchestrator(
        provider: Arc<RecordingProvider>,
        memory: Arc<dyn MemoryStore>,
    ) -> ChatOrchestrator {
        let completion = Arc::new(CompletionClient::new(provider, "llama-test"));
        ChatOrchestrator::new(completion, memory)
    }

    fn history(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::user(format!("q{i}"))
                } else {
                    ChatTurn::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn window_replays_max_turns_minus_two() {
        let window = context_window(&history(10), 10, "new question");

        assert_eq!(window.len(), 1 + 8 + 1);
        assert_eq!(window[0].role, Role::System);
        assert_eq!(window[1].content, "q2");
        assert_eq!(window[8].content, "a9");
        assert_eq!(window[9], ChatTurn::user("new question"));
    }

    #[test]
    fn window_with_short_history_replays_everything() {
        let window = context_window(&history(3), 10, "hi");
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn window_drops_non_conversational_roles_after_slicing() {
        let mut stored = history(6);
        stored.insert(4, ChatTurn::system("injected"));
        stored.insert(5, ChatTurn::new(Role::Unknown, "tool output"));

        // 8 stored, replay budget 8: both odd roles are inside the slice
        // and get dropped, leaving 6 history turns.
        let window = context_window(&stored, 10, "hi");
        assert_eq!(window.len(), 1 + 6 + 1);
        assert!(window[1..].iter().all(|t| t.role != Role::System));
        assert!(window.iter().all(|t| t.role != Role::Unknown));
    }

    #[tokio::test]
    async fn blank_message_short_circuits() {
        let provider = RecordingProvider::new("unused");
        let memory = Arc::new(InMemoryStore::new(10));
        let orch = orchestrator(provider.clone(), memory.clone());

        assert_eq!(orch.chat("   \n").await, EMPTY_MESSAGE_REPLY);
        assert_eq!(provider.calls(), 0);
        assert_eq!(
            memory.load().await.status,
            diabecare_core::memory::RecallStatus::Missing
        );
    }

    #[tokio::test]
    async fn chat_appends_pair_and_returns_reply() {
        let provider = RecordingProvider::new("  Aim for 80-130 mg/dL before meals.  ");
        let memory = Arc::new(InMemoryStore::new(10));
        let orch = orchestrator(provider.clone(), memory.clone());

        let reply = orch.chat("  What is a good fasting level?  ").await;
        assert_eq!(reply, "Aim for 80-130 mg/dL before meals.");

        let stored = memory.load().await.into_turns();
        assert_eq!(
            stored,
            vec![
                ChatTurn::user("What is a good fasting level?"),
                ChatTurn::assistant("Aim for 80-130 mg/dL before meals."),
            ]
        );

        let sent = provider.last_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1], ChatTurn::user("What is a good fasting level?"));
    }

    #[tokio::test]
    async fn prompt_and_storage_windows_differ() {
        let provider = RecordingProvider::new("answer");
        let memory = Arc::new(InMemoryStore::with_turns(10, history(10)));
        let orch = orchestrator(provider.clone(), memory.clone());

        orch.chat("next").await;

        // Provider saw system + 8 stored turns + the new message.
        let sent = provider.last_messages();
        assert_eq!(sent.len(), 10);
        assert_eq!(sent[1].content, "q2");

        // Storage kept the newest 10 of the 12 turns.
        let stored = memory.load().await.into_turns();
        assert_eq!(stored.len(), 10);
        assert_eq!(stored[0].content, "q2");
        assert_eq!(stored[8], ChatTurn::user("next"));
        assert_eq!(stored[9], ChatTurn::assistant("answer"));
    }

    #[tokio::test]
    async fn provider_failure_is_replied_and_stored() {
        let provider = RecordingProvider::failing(ProviderError::RateLimited {
            retry_after_secs: Some(2),
            message: "slow down".into(),
        });
        let memory = Arc::new(InMemoryStore::new(10));
        let orch = orchestrator(provider, memory.clone());

        assert_eq!(orch.chat("hello").await, RATE_LIMIT_REPLY);
        let stored = memory.load().await.into_turns();
        assert_eq!(stored[1], ChatTurn::assistant(RATE_LIMIT_REPLY));
    }

    #[tokio::test]
    async fn save_failure_does_not_fail_the_chat() {
        let provider = RecordingProvider::new("still answered");
        let orch = orchestrator(provider.clone(), Arc::new(ReadOnlyStore));

        assert_eq!(orch.chat("hello").await, "still answered");
        assert_eq!(provider.last_messages().len(), 4);
    }

    #[tokio::test]
    async fn corrupt_history_file_is_treated_as_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chat_memory.json");
        std::fs::write(&path, "{not json").unwrap();

        let provider = RecordingProvider::new("fresh start");
        let orch = orchestrator(provider.clone(), Arc::new(FileMemory::new(&path, 10)));

        assert_eq!(orch.chat("hi").await, "fresh start");
        assert_eq!(provider.last_messages().len(), 2);
        assert_eq!(orch.history().await.len(), 2);
    }

    #[tokio::test]
    async fn analyze_bypasses_history() {
        let provider = RecordingProvider::new("Report");
        let memory = Arc::new(InMemoryStore::with_turns(10, history(4)));
        let orch = orchestrator(provider.clone(), memory.clone());

        let reply = orch
            .analyze(&HealthData::new("250", "Metformin", "Walked 30 min"))
            .await;
        assert_eq!(reply, "Report");

        let sent = provider.last_messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[1].content.contains("Blood Sugar Level: 250 mg/dL"));
        assert_eq!(memory.load().await.turns, history(4));
    }

    #[tokio::test]
    async fn clear_history_empties_store() {
        let memory = Arc::new(InMemoryStore::with_turns(10, history(4)));
        let orch = orchestrator(RecordingProvider::new("x"), memory);

        orch.clear_history().await.unwrap();
        assert!(orch.history().await.is_empty());
    }
}
