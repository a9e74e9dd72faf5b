//! Model client implementations for Deskmate.
//!
//! All providers implement the `deskmate_core::Provider` trait. The only
//! backend shipped is the OpenAI-compatible chat completions client, which
//! covers OpenRouter, OpenAI, and self-hosted gateways alike.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
