//! Data Store Collaborators
//!
//! This module defines the seams the operation handlers talk through:
//! - `DocumentStore` / `PageIterator`: the paginated query capability
//! - `Embedder`: text to vector
//! - `Query`: the structured query a handler asks for
//!
//! plus the concrete implementations shipped with the server.

pub mod embedding;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use embedding::{EmbeddingError, Embedder, OpenAiEmbedder};
pub use memory::MemoryStore;
pub use query::{DocumentFilter, Query, SqlQuery};

/// Failure reported by the store, with the upstream status code when known.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl StoreError {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(format!("Resource Not Found: {}", what), Some(404))
    }
}

/// Lazily fetched pages of raw documents.
#[async_trait]
pub trait PageIterator: Send {
    /// Whether another call to `next_page` may yield documents.
    fn has_more(&self) -> bool;

    /// Fetches the next page.
    async fn next_page(&mut self) -> Result<Vec<Value>, StoreError>;
}

/// The paginated query capability of the backing store.
///
/// Implementations are shared by every request, so they must be safe for
/// concurrent use and must not be mutated after construction.
///
/// A backend talking to a real account sends `query.to_sql()` (text plus
/// named parameters) and pages through the response; `MemoryStore` evaluates
/// the `Query` structurally and only logs the rendered text.
pub trait DocumentStore: Send + Sync {
    fn open(&self, query: Query, max_page_size: usize) -> Box<dyn PageIterator>;
}
