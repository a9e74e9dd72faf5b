//! Session-level chat entry point shared by every transport.

use std::sync::Arc;

use deskmate_core::error::{Result, StoreError};
use deskmate_core::message::ConversationId;
use deskmate_core::store::ConversationStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::loop_runner::{AgentLoop, TurnStatus};

/// Returned instead of running a turn when the workspace has no usable credentials.
pub const AUTH_REQUIRED_REPLY: &str =
    "Your Google account is not connected yet. Please sign in with Google first, then ask me again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Message,
    Error,
}

/// What a transport sends back for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
}

impl ChatReply {
    pub fn message(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            kind: ReplyKind::Message,
        }
    }

    pub fn error(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            kind: ReplyKind::Error,
        }
    }
}

/// Loads a session, runs one turn, saves the result.
///
/// The session lock is held from load to save, so concurrent requests on
/// the same session id run their turns one after the other.
pub struct ChatService {
    agent: AgentLoop,
    store: Arc<dyn ConversationStore>,
}

impl ChatService {
    pub fn new(agent: AgentLoop, store: Arc<dyn ConversationStore>) -> Self {
        Self { agent, store }
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub async fn chat(&self, session: &ConversationId, message: &str) -> Result<ChatReply> {
        if !self.agent.registry().is_authorized().await {
            warn!(session_id = %session, "Workspace not authorized, skipping turn");
            return Ok(ChatReply::error(AUTH_REQUIRED_REPLY));
        }

        let _guard = self.store.lock(session).await;
        let history = self.store.load(session).await?;
        let outcome = self.agent.turn(session, message, history).await;
        self.store.save(session, outcome.history).await?;

        info!(
            session_id = %session,
            iterations = outcome.iterations,
            status = ?outcome.status,
            "Turn finished"
        );

        Ok(match outcome.status {
            TurnStatus::TransportError => ChatReply::error(outcome.reply),
            TurnStatus::Completed | TurnStatus::IterationLimit => ChatReply::message(outcome.reply),
        })
    }

    /// Forget a session's history. Returns whether there was any.
    pub async fn clear(&self, session: &ConversationId) -> std::result::Result<bool, StoreError> {
        let _guard = self.store.lock(session).await;
        let removed = self.store.clear(session).await?;
        info!(session_id = %session, removed, "Session cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loop_runner::TRANSPORT_ERROR_REPLY;
    use crate::test_helpers::{RecordingWorkspace, ScriptedProvider, registry_over};
    use deskmate_core::error::ProviderError;
    use deskmate_core::provider::Provider;
    use deskmate_memory::InMemoryStore;

    fn service(provider: Arc<dyn Provider>, workspace: RecordingWorkspace) -> (ChatService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let agent = AgentLoop::new(provider, registry_over(Arc::new(workspace)), "scripted-model");
        (ChatService::new(agent, store.clone()), store)
    }

    #[tokio::test]
    async fn turns_accumulate_history() {
        let provider = Arc::new(ScriptedProvider::texts(&["first", "second"]));
        let (service, store) = service(provider.clone(), RecordingWorkspace::new());
        let session = ConversationId::from("s1");

        assert_eq!(service.chat(&session, "one").await.unwrap(), ChatReply::message("first"));
        assert_eq!(service.chat(&session, "two").await.unwrap(), ChatReply::message("second"));

        assert_eq!(store.load(&session).await.unwrap().len(), 4);
        // The second request carried the first turn.
        assert_eq!(provider.requests()[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn unauthorized_workspace_short_circuits() {
        let provider = Arc::new(ScriptedProvider::texts(&[]));
        let (service, store) = service(provider.clone(), RecordingWorkspace::unauthorized());

        let reply = service.chat(&ConversationId::from("s1"), "list files").await.unwrap();

        assert_eq!(reply, ChatReply::error(AUTH_REQUIRED_REPLY));
        assert_eq!(provider.call_count(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_reply_but_still_stored() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network("refused".into()))]));
        let (service, store) = service(provider, RecordingWorkspace::new());
        let session = ConversationId::from("s1");

        let reply = service.chat(&session, "hello").await.unwrap();

        assert_eq!(reply, ChatReply::error(TRANSPORT_ERROR_REPLY));
        let history = store.load(&session).await.unwrap();
        assert_eq!(history.messages()[1].content, TRANSPORT_ERROR_REPLY);
    }

    #[tokio::test]
    async fn clear_drops_only_that_session() {
        let provider = Arc::new(ScriptedProvider::texts(&["a", "b"]));
        let (service, store) = service(provider, RecordingWorkspace::new());
        let (s1, s2) = (ConversationId::from("s1"), ConversationId::from("s2"));
        service.chat(&s1, "x").await.unwrap();
        service.chat(&s2, "y").await.unwrap();

        assert!(service.clear(&s1).await.unwrap());
        assert!(!service.clear(&s1).await.unwrap());
        assert!(store.load(&s1).await.unwrap().is_empty());
        assert_eq!(store.load(&s2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_do_not_lose_history() {
        let provider = Arc::new(ScriptedProvider::texts(&["a", "b"]));
        let (service, store) = service(provider, RecordingWorkspace::new());
        let service = Arc::new(service);
        let session = ConversationId::from("shared");

        let first = tokio::spawn({
            let (service, session) = (service.clone(), session.clone());
            async move { service.chat(&session, "one").await.unwrap() }
        });
        let second = tokio::spawn({
            let (service, session) = (service.clone(), session.clone());
            async move { service.chat(&session, "two").await.unwrap() }
        });
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(store.load(&session).await.unwrap().len(), 4);
    }

    #[test]
    fn reply_serializes_with_type_tag() {
        let json = serde_json::to_value(ChatReply::message("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"reply": "hi", "type": "message"}));
    }
}
