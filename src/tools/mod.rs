//! Cosmos DB Tools Domain Module
//!
//! This module contains the read-only operations exposed to MCP clients:
//! - Argument coercion (tagged values, strict accessors)
//! - The tool registry (contracts + handler functions)
//! - Operation handlers and schema approximation
//! - Application state shared by every request

pub mod args;
pub mod handlers;
pub mod registry;
pub mod schema;
pub mod state;

// Re-export commonly used types for convenience
pub use args::{ArgValue, ToolArguments};
pub use registry::{ToolContract, ToolRegistry};
pub use state::{AppState, SharedState, ToolContext};
