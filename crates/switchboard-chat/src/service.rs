//! Chat service: one question in, one terminal answer out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, info_span, warn, Instrument};

use switchboard_core::config::ChatConfig;
use switchboard_core::types::{ConversationId, HistoryEntry, Message, MessageRole};
use switchboard_dispatch::{ConversationState, Coordinator, Role, Termination, Verdict};
use switchboard_storage::HistoryStore;

use crate::error::ChatError;

/// Idle per-conversation locks are pruned once the map grows past this.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Answer to one question.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message: String,
    /// Wall-clock processing time in seconds.
    pub time_taken: f64,
    pub conversation: ConversationId,
    pub verdict: Verdict,
    pub termination: Termination,
    /// Whether the turn was appended to history.
    pub persisted: bool,
}

/// Variant-independent view of a chat service, for the transport layer.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn handle(&self, id: ConversationId, question: &str) -> Result<ChatReply, ChatError>;

    /// Stored turns of a conversation, oldest first.
    async fn history(&self, id: &ConversationId, limit: usize) -> Result<Vec<HistoryEntry>, ChatError>;

    /// Delete a conversation. Returns whether it existed.
    async fn clear(&self, id: &ConversationId) -> Result<bool, ChatError>;

    /// Identifiers of the registered roles.
    fn roles(&self) -> Vec<&'static str>;
}

/// Chat service for role alphabet `R`.
pub struct ChatService<R: Role> {
    coordinator: Coordinator<R>,
    store: Arc<dyn HistoryStore>,
    config: ChatConfig,
    locks: Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<R: Role> ChatService<R> {
    pub fn new(coordinator: Coordinator<R>, store: Arc<dyn HistoryStore>, config: ChatConfig) -> Self {
        Self {
            coordinator,
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &Coordinator<R> {
        &self.coordinator
    }

    fn validate(&self, id: &ConversationId, question: &str) -> Result<(), ChatError> {
        if id.user_id.trim().is_empty() {
            return Err(ChatError::InvalidConversation("user_id must not be empty".to_string()));
        }
        if id.thread_id.trim().is_empty() {
            return Err(ChatError::InvalidConversation("thread_id must not be empty".to_string()));
        }
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if question.chars().count() > self.config.max_question_length {
            return Err(ChatError::QuestionTooLong(self.config.max_question_length));
        }
        Ok(())
    }

    /// The lock serializing work on one conversation.
    fn conversation_lock(&self, id: &ConversationId) -> Result<Arc<tokio::sync::Mutex<()>>, ChatError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| ChatError::HistoryUnavailable(format!("lock table poisoned: {}", e)))?;
        if locks.len() > LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        Ok(locks.entry(id.clone()).or_default().clone())
    }

    /// Prior turns for a new run. `None` means the store is unavailable and
    /// the run proceeds statelessly.
    fn load_prior(&self, id: &ConversationId) -> Result<Option<Vec<Message>>, ChatError> {
        match self.store.get(id, self.config.history_window) {
            Ok(entries) => Ok(Some(
                entries.into_iter().map(HistoryEntry::into_prior_message).collect(),
            )),
            Err(e) if self.config.degrade_on_history_failure => {
                warn!(error = %e, "History unavailable, continuing without prior turns");
                Ok(None)
            }
            Err(e) => Err(ChatError::HistoryUnavailable(e.to_string())),
        }
    }

    async fn run_locked(&self, id: ConversationId, question: &str, start: Instant) -> Result<ChatReply, ChatError> {
        let lock = self.conversation_lock(&id)?;
        let _guard = lock.lock().await;

        let prior = self.load_prior(&id)?;
        let store_available = prior.is_some();
        let state = ConversationState::<R>::with_prior(prior.unwrap_or_default(), question)?;

        let timeout_secs = self.config.run_timeout_secs;
        let outcome = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.coordinator.run(state),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                if e.is_contract_violation() {
                    error!(error = %e, "Run aborted on contract violation");
                } else {
                    warn!(error = %e, "Run failed");
                }
                return Err(ChatError::Run(e));
            }
            Err(_) => {
                warn!(timeout_secs, "Run timed out");
                return Err(ChatError::Timeout(timeout_secs));
            }
        };

        let persisted = if store_available {
            let turn = [
                HistoryEntry::new(MessageRole::User, question),
                HistoryEntry::new(MessageRole::Assistant, outcome.final_text.clone()),
            ];
            match self.store.put(&id, &turn) {
                Ok(()) => true,
                Err(e) if self.config.degrade_on_history_failure => {
                    warn!(error = %e, "Failed to append history, answer not persisted");
                    false
                }
                Err(e) => return Err(ChatError::HistoryUnavailable(e.to_string())),
            }
        } else {
            false
        };

        let time_taken = start.elapsed().as_secs_f64();
        info!(
            termination = %outcome.termination,
            verdict = %outcome.verdict,
            time_taken,
            persisted,
            "Question answered"
        );

        Ok(ChatReply {
            message: outcome.final_text,
            time_taken,
            conversation: id,
            verdict: outcome.verdict,
            termination: outcome.termination,
            persisted,
        })
    }
}

#[async_trait]
impl<R: Role> ChatEngine for ChatService<R> {
    async fn handle(&self, id: ConversationId, question: &str) -> Result<ChatReply, ChatError> {
        let start = Instant::now();
        self.validate(&id, question)?;

        let span = info_span!("run", conversation = %id);
        self.run_locked(id, question, start).instrument(span).await
    }

    async fn history(&self, id: &ConversationId, limit: usize) -> Result<Vec<HistoryEntry>, ChatError> {
        Ok(self.store.get(id, limit)?)
    }

    async fn clear(&self, id: &ConversationId) -> Result<bool, ChatError> {
        let lock = self.conversation_lock(id)?;
        let _guard = lock.lock().await;
        let existed = self.store.clear(id)?;
        info!(conversation = %id, existed, "Conversation cleared");
        Ok(existed)
    }

    fn roles(&self) -> Vec<&'static str> {
        self.coordinator
            .registry()
            .roles()
            .iter()
            .map(|role| role.id())
            .collect()
    }
}
