//! Configuration for embedding generation.

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Vector length used by the hash fallback (matches MiniLM-sized models).
pub const DEFAULT_DIMENSION: usize = 384;

/// Number of embeddings kept in the in-process memo.
pub const DEFAULT_MEMO_CAPACITY: usize = 100;

/// Base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Base URL of a local Ollama server's OpenAI-compatible API.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an [`crate::EmbeddingGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model endpoint to try first. Without one the generator goes straight
    /// to the hash fallback.
    pub model: Option<ModelConfig>,

    /// Vector length of the hash fallback.
    pub fallback_dimension: usize,

    /// Maximum number of memoized embeddings.
    pub memo_capacity: usize,
}

impl EmbeddingConfig {
    /// Set the model endpoint.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the fallback dimension.
    pub fn with_fallback_dimension(mut self, dimension: usize) -> Self {
        self.fallback_dimension = dimension;
        self
    }

    /// Set the memo capacity.
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.fallback_dimension == 0 {
            return Err(EmbeddingError::Config(
                "fallback_dimension must be greater than zero".to_string(),
            ));
        }
        if self.memo_capacity == 0 {
            return Err(EmbeddingError::Config(
                "memo_capacity must be greater than zero".to_string(),
            ));
        }
        if self
            .model
            .as_ref()
            .is_some_and(|model| model.base_url.trim().is_empty())
        {
            return Err(EmbeddingError::Config("model base_url is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: None,
            fallback_dimension: DEFAULT_DIMENSION,
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }
}

/// An OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API base URL, without the `/embeddings` suffix.
    pub base_url: String,

    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token, if the endpoint needs one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ModelConfig {
    /// Create a configuration for the given endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: default_model(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// The OpenAI API with the given key.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(OPENAI_BASE_URL).with_api_key(api_key)
    }

    /// A local Ollama server serving `model`.
    pub fn ollama(model: impl Into<String>) -> Self {
        Self::new(OLLAMA_BASE_URL).with_model(model)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Full URL of the embeddings route.
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.fallback_dimension, 384);
        assert_eq!(config.memo_capacity, 100);
        assert!(config.model.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(
            EmbeddingConfig::default()
                .with_fallback_dimension(0)
                .validate()
                .is_err()
        );
        assert!(
            EmbeddingConfig::default()
                .with_memo_capacity(0)
                .validate()
                .is_err()
        );
        assert!(
            EmbeddingConfig::default()
                .with_model(ModelConfig::new("  "))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_embeddings_url_trims_slash() {
        let model = ModelConfig::new("http://localhost:11434/v1/");
        assert_eq!(model.embeddings_url(), "http://localhost:11434/v1/embeddings");
    }

    #[test]
    fn test_model_config_deserialize_defaults() {
        let model: ModelConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8080"}"#).unwrap();
        assert_eq!(model.model, "text-embedding-3-small");
        assert_eq!(model.timeout_secs, 30);
        assert_eq!(model.api_key, None);
    }

    #[test]
    fn test_presets() {
        let openai = ModelConfig::openai("sk-test");
        assert_eq!(openai.embeddings_url(), "https://api.openai.com/v1/embeddings");
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));

        let ollama = ModelConfig::ollama("nomic-embed-text");
        assert_eq!(ollama.embeddings_url(), "http://localhost:11434/v1/embeddings");
        assert_eq!(ollama.model, "nomic-embed-text");
        assert_eq!(ollama.api_key, None);
    }
}
