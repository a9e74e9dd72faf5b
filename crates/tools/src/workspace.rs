//! Workspace trait: the external operation contract.
//!
//! A workspace executes decoded operations against some backing service.
//! Missing or expired access is reported as `ToolError::AuthRequired`, never
//! as a sentinel value.

use async_trait::async_trait;
use deskmate_core::error::ToolError;
use serde_json::Value;

use crate::operation::Operation;

#[async_trait]
pub trait Workspace: Send + Sync {
    /// Backend name (e.g., "google").
    fn name(&self) -> &str;

    /// Whether usable credentials are present right now.
    async fn is_authorized(&self) -> bool;

    /// Run one operation and return its JSON-serializable result.
    async fn execute(&self, operation: Operation) -> Result<Value, ToolError>;
}
