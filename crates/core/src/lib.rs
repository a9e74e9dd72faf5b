//! # Deskmate Core
//!
//! Domain types, traits, and error definitions for the Deskmate agent runtime.
//! This crate has **zero framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! Every seam is a trait here (`Provider`, `ConversationStore`); the
//! implementations live in their own crates so tests can swap in stubs.

pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StoreError, ToolError};
pub use message::{ConversationHistory, ConversationId, MAX_HISTORY, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use store::{ConversationStore, SessionGuard};
pub use tool::{ParamKind, ParamSpec, ToolCall, ToolName, ToolResult, ToolSpec};
