//! Error types for embedding generation.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur while producing embeddings.
///
/// None of these reach callers of [`crate::EmbeddingGenerator::embed`]; they
/// are logged and replaced by the zero vector there.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The model backend could not be loaded.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from the model endpoint.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The model returned a vector of unexpected length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration value.
    #[error("invalid embedding configuration: {0}")]
    Config(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
