//! Runtime configuration
//!
//! Parsed once at process start (flags or environment variables) and shared
//! read-only with every component that needs it.

use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};

/// Role a principal must carry to invoke tools.
pub const DEFAULT_REQUIRED_ROLE: &str = "Mcp.Tool.Executor";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "cosmos-mcp-toolkit",
    version,
    about = "Read-only Cosmos DB tools exposed over MCP"
)]
pub struct Config {
    #[arg(long, env = "MCP_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Disable authentication entirely (local development only).
    #[arg(long, env = "DEV_BYPASS_AUTH", default_value_t = false)]
    pub dev_bypass_auth: bool,

    /// HS256 key used to verify bearer tokens.
    #[arg(long, env = "MCP_JWT_SECRET", default_value = "")]
    pub jwt_secret: String,

    #[arg(long, env = "MCP_JWT_ISSUER")]
    pub jwt_issuer: Option<String>,

    #[arg(long, env = "MCP_JWT_AUDIENCE")]
    pub jwt_audience: Option<String>,

    #[arg(long, env = "MCP_REQUIRED_ROLE", default_value = DEFAULT_REQUIRED_ROLE)]
    pub required_role: String,

    /// JSON file of the form `{ "<db>": { "<container>": [docs...] } }`.
    #[arg(long, env = "COSMOS_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    #[arg(long, env = "OPENAI_ENDPOINT")]
    pub openai_endpoint: Option<String>,

    #[arg(long, env = "OPENAI_EMBEDDING_DEPLOYMENT")]
    pub embedding_deployment: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<u32>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "MCP_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Config {
    /// Configuration with authentication on and nothing else wired up.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Self::default()
        }
    }

    /// Configuration with authentication bypassed.
    pub fn dev_bypass() -> Self {
        Self {
            dev_bypass_auth: true,
            ..Self::default()
        }
    }

    pub fn auth_enabled(&self) -> bool {
        !self.dev_bypass_auth
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            dev_bypass_auth: false,
            jwt_secret: String::new(),
            jwt_issuer: None,
            jwt_audience: None,
            required_role: DEFAULT_REQUIRED_ROLE.to_string(),
            seed_file: None,
            openai_endpoint: None,
            embedding_deployment: None,
            openai_api_key: None,
            embedding_dimensions: None,
            log_json: false,
        }
    }
}
