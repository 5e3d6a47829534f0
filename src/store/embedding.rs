//! Embedding capability
//!
//! `Embedder` turns a search text into a vector. `OpenAiEmbedder` calls an
//! Azure OpenAI embeddings deployment over HTTPS.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_VERSION: &str = "2023-05-15";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Transport(String),

    #[error("embedding service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("embedding response contained no vectors")]
    Empty,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, dimensions: Option<u32>) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

/// Client for `{endpoint}/openai/deployments/{deployment}/embeddings`.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl OpenAiEmbedder {
    pub fn new(endpoint: &str, deployment: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: embeddings_url(endpoint, deployment),
            api_key,
        }
    }
}

fn embeddings_url(endpoint: &str, deployment: &str) -> String {
    format!(
        "{}/openai/deployments/{}/embeddings?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        API_VERSION
    )
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str, dimensions: Option<u32>) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.http.post(&self.url).json(&EmbeddingRequest {
            input: text,
            dimensions,
        });
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or(EmbeddingError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_deployment_url() {
        assert_eq!(
            embeddings_url("https://acct.openai.azure.com/", "text-embedding-3-small"),
            "https://acct.openai.azure.com/openai/deployments/text-embedding-3-small/embeddings?api-version=2023-05-15"
        );
    }

    #[test]
    fn request_omits_absent_dimensions() {
        let body = serde_json::to_value(EmbeddingRequest {
            input: "hello",
            dimensions: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "input": "hello" }));
    }
}
