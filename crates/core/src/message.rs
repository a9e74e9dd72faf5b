//! Message and conversation history domain types.
//!
//! These are the value objects that flow through a turn:
//! user text → stored history → model message list → final reply → stored history.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default cap on stored history entries per session.
pub const MAX_HISTORY: usize = 30;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::from("default")
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (tool catalog, rules, timestamp)
    System,
    /// The end user, or a synthetic tool-result summary
    User,
    /// The model
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// The stored, bounded history of one session.
///
/// Only completed turns are appended: the user's text and the final reply.
/// The system prompt is never stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing messages, trimming to `limit` from the front.
    pub fn from_messages(messages: Vec<Message>, limit: usize) -> Self {
        let mut history = Self { messages };
        history.trim(limit);
        history
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one completed turn and enforce the cap.
    pub fn push_turn(&mut self, user_text: impl Into<String>, reply: impl Into<String>, limit: usize) {
        self.messages.push(Message::user(user_text));
        self.messages.push(Message::assistant(reply));
        self.trim(limit);
    }

    /// Drop the oldest entries until at most `limit` remain.
    pub fn trim(&mut self, limit: usize) {
        if self.messages.len() > limit {
            let excess = self.messages.len() - limit;
            self.messages.drain(..excess);
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
