//! Azure Cosmos DB MCP Toolkit
//!
//! This library provides a read-only Model Context Protocol server over a
//! Cosmos DB style document store: seven query tools behind bearer-token
//! authentication, exposed over JSON-RPC and a small REST surface.

// Domain modules
pub mod mcp;
pub mod store;
pub mod tools;

// Cross-cutting concerns
pub mod auth;
pub mod config;
pub mod error;

// Infrastructure
pub mod api;
pub mod router;
