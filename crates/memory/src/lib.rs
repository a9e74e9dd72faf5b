//! Conversation store implementations for Deskmate.

pub mod in_memory;

pub use in_memory::InMemoryStore;
