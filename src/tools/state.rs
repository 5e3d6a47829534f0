//! Application State
//!
//! Everything a request needs, built once at startup and shared read-only.

use std::sync::Arc;

use super::registry::ToolRegistry;
use crate::{
    auth::AuthGate,
    config::Config,
    store::{DocumentStore, Embedder, OpenAiEmbedder},
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Collaborators handed to every operation handler.
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<dyn DocumentStore>,
    /// `None` when no embedding endpoint is configured.
    pub embedder: Option<Arc<dyn Embedder>>,
    pub embedding_dimensions: Option<u32>,
}

pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthGate,
    pub registry: ToolRegistry,
    pub tools: ToolContext,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Self {
        let auth = AuthGate::new(&config);
        let tools = ToolContext {
            store,
            embedder,
            embedding_dimensions: config.embedding_dimensions,
        };
        Self {
            config: Arc::new(config),
            auth,
            registry: ToolRegistry::new(),
            tools,
        }
    }

    /// Builds the embedding client described by `config`, if any.
    pub fn embedder_from_config(config: &Config) -> Option<Arc<dyn Embedder>> {
        let endpoint = config.openai_endpoint.as_deref().filter(|s| !s.trim().is_empty())?;
        let deployment = config
            .embedding_deployment
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some(Arc::new(OpenAiEmbedder::new(
            endpoint,
            deployment,
            config.openai_api_key.clone(),
        )))
    }
}
