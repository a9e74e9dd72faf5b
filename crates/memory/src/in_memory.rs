//! In-memory conversation store. Nothing survives a restart.

use async_trait::async_trait;
use deskmate_core::error::StoreError;
use deskmate_core::message::{ConversationHistory, ConversationId, MAX_HISTORY};
use deskmate_core::store::{ConversationStore, SessionGuard};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Keeps each session's bounded history in a map.
///
/// Every saved history is trimmed to `limit` entries, oldest first.
pub struct InMemoryStore {
    histories: Arc<RwLock<HashMap<String, ConversationHistory>>>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    limit: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_limit(MAX_HISTORY)
    }

    /// A store keeping at most `limit` entries per session, capped at `MAX_HISTORY`.
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.min(MAX_HISTORY);
        Self {
            histories: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn lock(&self, session: &ConversationId) -> SessionGuard {
        let session_lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds an idle lock; holders and waiters keep a clone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(session.as_str().to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        session_lock.lock_owned().await
    }

    async fn load(&self, session: &ConversationId) -> Result<ConversationHistory, StoreError> {
        Ok(self
            .histories
            .read()
            .await
            .get(session.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        session: &ConversationId,
        mut history: ConversationHistory,
    ) -> Result<(), StoreError> {
        history.trim(self.limit);
        debug!(session = %session, entries = history.len(), "Saving history");
        self.histories
            .write()
            .await
            .insert(session.as_str().to_string(), history);
        Ok(())
    }

    async fn clear(&self, session: &ConversationId) -> Result<bool, StoreError> {
        let removed = self.histories.write().await.remove(session.as_str()).is_some();
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.histories.read().await.len())
    }
}
