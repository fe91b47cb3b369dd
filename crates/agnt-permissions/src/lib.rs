//! The permission gate: category capability flags, an
//! MCP-context bypass for batching frameworks that already hold outer
//! permission, and a risk-class + grant-map check for everything else.

mod capability;
mod error;
mod gate;
mod grant;
mod mcp_context;
mod prompt;
mod store;

pub use error::{Error, Result};
pub use gate::PermissionGate;
pub use grant::{GrantScope, PermissionKey, PromptChoice};
pub use mcp_context::{in_mcp_context, with_mcp_context};
pub use prompt::{FixedPromptHandler, PromptHandler};
pub use store::GrantStore;
