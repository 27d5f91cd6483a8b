//! Error types for the similarity cache.

use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur inside the similarity cache.
///
/// Only constructors and [`crate::CacheConfig`] loading return these. The
/// lookup and mutation operations on [`crate::SimilarityCache`] log them and
/// return a safe default instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] simcache_embeddings::EmbeddingError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
