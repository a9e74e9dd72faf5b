//! ConversationStore trait: session-keyed bounded history.
//!
//! The store is the only genuinely mutable shared state in the runtime.
//! Callers that run a turn hold the session's guard for the whole turn, so
//! two turns on the same session id never interleave their load and save.

use async_trait::async_trait;
use crate::error::StoreError;
use crate::message::{ConversationHistory, ConversationId};

/// Exclusive access to one session for the duration of a turn.
pub type SessionGuard = tokio::sync::OwnedMutexGuard<()>;

/// The core ConversationStore trait.
///
/// Implementations: in-memory (no durability across restarts).
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Acquire the per-session lock. Waits while another turn holds it.
    async fn lock(&self, session: &ConversationId) -> SessionGuard;

    /// Load a session's history. A session never seen before is empty.
    async fn load(&self, session: &ConversationId) -> Result<ConversationHistory, StoreError>;

    /// Replace a session's history.
    async fn save(&self, session: &ConversationId, history: ConversationHistory) -> Result<(), StoreError>;

    /// Drop a session's history. Returns whether anything was removed.
    async fn clear(&self, session: &ConversationId) -> Result<bool, StoreError>;

    /// Number of sessions with stored history.
    async fn count(&self) -> Result<usize, StoreError>;
}
