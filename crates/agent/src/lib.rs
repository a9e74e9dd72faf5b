//! The Deskmate agent: turns one user message into one reply.
//!
//! A turn follows a **request → act → observe** cycle:
//!
//! 1. Build the message list (fresh system prompt + stored history + user message)
//! 2. Call the model
//! 3. Extract tool-call directives from its free-form text
//! 4. If there are any: dispatch them in order, feed the results back, go to 2
//! 5. Otherwise: sanitize the text and store it as the reply
//!
//! The loop is bounded by `max_iterations`; see [`loop_runner`] for what
//! happens when the bound is hit or the model call fails.

pub mod extractor;
pub mod loop_runner;
pub mod prompt;
pub mod sanitizer;
pub mod scan;
pub mod service;

#[cfg(test)]
mod test_helpers;

pub use extractor::extract_tool_calls;
pub use loop_runner::{AgentLoop, FALLBACK_REPLY, TRANSPORT_ERROR_REPLY, TurnOutcome, TurnStatus};
pub use prompt::build_system_prompt;
pub use sanitizer::sanitize;
pub use service::{AUTH_REQUIRED_REPLY, ChatReply, ChatService, ReplyKind};
