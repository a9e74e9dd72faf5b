//! Tool catalog and operation dispatch for Deskmate.
//!
//! The model may request any of a closed set of workspace operations. This
//! crate owns the catalog advertised to the model, the typed argument
//! structs behind each tool, the registry that turns a raw `ToolCall` into a
//! `ToolResult`, and the Google REST backend that performs the work.

pub mod catalog;
pub mod credentials;
pub mod google;
pub mod operation;
pub mod registry;
pub mod workspace;

pub use catalog::catalog;
pub use credentials::{CredentialSource, NoCredentials, StaticToken, TokenFile};
pub use google::{GoogleEndpoints, GoogleWorkspace};
pub use operation::Operation;
pub use registry::OperationRegistry;
pub use workspace::Workspace;
