use anyhow::Context;
use clap::Parser;
use cosmos_mcp_toolkit::config::Config;
use cosmos_mcp_toolkit::router::create_app_router;
use cosmos_mcp_toolkit::store::{DocumentStore, MemoryStore};
use cosmos_mcp_toolkit::tools::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = match &config.seed_file {
        Some(path) => {
            let store = MemoryStore::load(path)
                .await
                .with_context(|| format!("loading seed file {}", path.display()))?;
            tracing::info!(path = %path.display(), "document store seeded");
            store
        }
        None => {
            tracing::warn!("no seed file configured; document store is empty");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    if !config.auth_enabled() {
        tracing::warn!("authentication is bypassed; every caller acts as the development user");
    } else if config.jwt_secret.is_empty() {
        tracing::warn!("no token secret configured; tool calls will be rejected");
    }

    // Initialize application state
    let store = build_store(&config).await?;
    let embedder = AppState::embedder_from_config(&config);
    if embedder.is_none() {
        tracing::warn!("embedding endpoint not configured; vector_search is unavailable");
    }
    let addr = config.addr;
    let state = Arc::new(AppState::new(config, store, embedder));

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    tracing::info!(%addr, "server running");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_seed_file_is_reported() {
        let config = Config {
            seed_file: Some(PathBuf::from("/nonexistent/seed.json")),
            ..Config::dev_bypass()
        };
        let err = build_store(&config).await.err().unwrap();
        assert!(err.to_string().contains("loading seed file"));
    }

    #[tokio::test]
    async fn no_seed_file_means_empty_store() {
        let state = AppState::new(Config::dev_bypass(), build_store(&Config::dev_bypass()).await.unwrap(), None);
        let tool = state.registry.resolve("list_databases").unwrap();
        let output = tool
            .invoke(&state.tools, &cosmos_mcp_toolkit::tools::ToolArguments::default())
            .await;
        assert_eq!(output, serde_json::json!([]));
    }
}
