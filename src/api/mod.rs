//! REST API Module
//!
//! Plain HTTP endpoints next to the MCP endpoint:
//! - Health and auth probes
//! - Tool listing and direct tool invocation

pub mod handlers;
pub mod models;

pub use handlers::routes;
