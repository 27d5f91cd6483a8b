//! Embedding strategies.
//!
//! [`Embedder`] is the capability interface the generator is built over. The
//! model-backed implementation here talks to any OpenAI-compatible
//! `/embeddings` endpoint (OpenAI, Ollama, LM Studio, ...); the hash fallback
//! lives in [`crate::fallback`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::Embedding;
use crate::config::ModelConfig;
use crate::error::{EmbeddingError, Result};

/// Text sent once while loading a model to discover its output dimension.
pub const PROBE_TEXT: &str = "embedding dimension probe";

/// A strategy that turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Get the name of this strategy.
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Whether nearby vectors mean similar text.
    fn is_semantic(&self) -> bool {
        true
    }

    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Embedder backed by a remote embedding model.
pub struct ModelBackedEmbedder {
    config: ModelConfig,

    /// HTTP client.
    client: reqwest::Client,

    /// Dimension reported by the model when it was loaded.
    dimension: usize,
}

impl ModelBackedEmbedder {
    /// Connect to the model and probe it once for its dimension.
    ///
    /// Fails with [`EmbeddingError::ModelUnavailable`] if the endpoint cannot
    /// produce a non-empty vector.
    pub async fn load(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut embedder = Self {
            config,
            client,
            dimension: 0,
        };

        let probe = embedder.request(PROBE_TEXT).await.map_err(|e| {
            EmbeddingError::ModelUnavailable(format!("{}: {e}", embedder.config.model))
        })?;
        if probe.is_empty() {
            return Err(EmbeddingError::ModelUnavailable(format!(
                "{}: model returned an empty embedding",
                embedder.config.model
            )));
        }

        embedder.dimension = probe.len();
        info!(
            "Loaded embedding model {} ({} dimensions)",
            embedder.config.model, embedder.dimension
        );
        Ok(embedder)
    }

    /// The endpoint configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    async fn request(&self, text: &str) -> Result<Embedding> {
        debug!("Generating embedding with model: {}", self.config.model);

        let body = serde_json::json!({
            "input": text,
            "model": self.config.model,
        });

        let mut request = self
            .client
            .post(self.config.embeddings_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        let result: EmbeddingsResponse = response.json().await?;

        result
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))
    }
}

#[async_trait]
impl Embedder for ModelBackedEmbedder {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let embedding = self.request(text).await?;
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}

/// OpenAI-compatible response format.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
