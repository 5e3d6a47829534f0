//! Model Context Protocol (MCP) Module
//!
//! This module contains the JSON-RPC surface of the server, including:
//! - Protocol models (envelope, method routing, constants)
//! - RPC helpers (success/error envelopes, text content)
//! - The dispatcher (initialize, tools/list, tools/call, notifications)

pub mod handlers;
pub mod helpers;
pub mod models;

// Re-export commonly used types and functions
pub use handlers::{dispatch, routes, Outcome};
