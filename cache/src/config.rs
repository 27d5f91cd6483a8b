//! Configuration for the similarity cache.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simcache_embeddings::EmbeddingConfig;
use tokio::fs;

use crate::error::{CacheError, Result};

/// Default score a match must exceed.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Matches scoring above this are remembered as exact-match shortcuts.
pub const DEFAULT_SHORTCUT_THRESHOLD: f32 = 0.95;

/// The store is flushed on every n-th addition.
pub const DEFAULT_FLUSH_EVERY: usize = 10;

/// Entries compared between scheduler yields during a scan.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 50;

/// File holding the persisted embeddings.
pub const EMBEDDING_CACHE_FILE: &str = "embedding_cache.json";

/// File holding the persisted exact-match shortcuts.
pub const QUERY_HASH_CACHE_FILE: &str = "query_hash_cache.json";

/// Configuration for a [`crate::SimilarityCache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the cache files.
    pub cache_dir: PathBuf,

    /// Default threshold for `find_similar` (exclusive).
    pub similarity_threshold: f32,

    /// Score above which a match becomes an exact-match shortcut.
    pub shortcut_threshold: f32,

    /// Flush the store on every n-th addition.
    pub flush_every: usize,

    /// Entries compared between scheduler yields.
    pub scan_batch_size: usize,

    /// Whether shortcuts survive restarts.
    pub persist_exact_index: bool,

    /// Embedding generator configuration.
    pub embedding: EmbeddingConfig,
}

impl CacheConfig {
    /// Create a configuration with default values rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            shortcut_threshold: DEFAULT_SHORTCUT_THRESHOLD,
            flush_every: DEFAULT_FLUSH_EVERY,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            persist_exact_index: false,
            embedding: EmbeddingConfig::default(),
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&content)
    }

    /// Set the default similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the shortcut threshold.
    pub fn with_shortcut_threshold(mut self, threshold: f32) -> Self {
        self.shortcut_threshold = threshold;
        self
    }

    /// Set how many additions trigger a flush.
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n;
        self
    }

    /// Set the scan batch size.
    pub fn with_scan_batch_size(mut self, n: usize) -> Self {
        self.scan_batch_size = n;
        self
    }

    /// Persist exact-match shortcuts next to the store.
    pub fn with_persist_exact_index(mut self, enabled: bool) -> Self {
        self.persist_exact_index = enabled;
        self
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Path of the embedding store file.
    pub fn store_path(&self) -> PathBuf {
        self.cache_dir.join(EMBEDDING_CACHE_FILE)
    }

    /// Path of the exact-match shortcut file.
    pub fn exact_index_path(&self) -> PathBuf {
        self.cache_dir.join(QUERY_HASH_CACHE_FILE)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("shortcut_threshold", self.shortcut_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CacheError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.flush_every == 0 {
            return Err(CacheError::Config(
                "flush_every must be greater than zero".to_string(),
            ));
        }
        if self.scan_batch_size == 0 {
            return Err(CacheError::Config(
                "scan_batch_size must be greater than zero".to_string(),
            ));
        }
        self.embedding.validate()?;
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(dirs::home_dir().unwrap_or_default().join(".ai_cache"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::new("/tmp/cache");
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.shortcut_threshold, 0.95);
        assert_eq!(config.flush_every, 10);
        assert_eq!(config.store_path(), PathBuf::from("/tmp/cache/embedding_cache.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_dir_is_ai_cache() {
        assert!(CacheConfig::default().cache_dir.ends_with(".ai_cache"));
    }

    #[test]
    fn test_from_toml() {
        let config = CacheConfig::from_toml_str(
            r#"
            cache_dir = "/var/cache/simcache"
            similarity_threshold = 0.9
            persist_exact_index = true

            [embedding]
            memo_capacity = 50

            [embedding.model]
            base_url = "http://localhost:11434/v1"
            model = "nomic-embed-text"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/simcache"));
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.shortcut_threshold, 0.95);
        assert!(config.persist_exact_index);
        assert_eq!(config.embedding.memo_capacity, 50);
        assert_eq!(config.embedding.fallback_dimension, 384);

        let model = config.embedding.model.unwrap();
        assert_eq!(model.model, "nomic-embed-text");
        assert_eq!(model.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = CacheConfig::from_toml_str("similarity_threshold = 1.5");
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_invalid_embedding_config_rejected() {
        let result = CacheConfig::from_toml_str("[embedding]\nmemo_capacity = 0");
        assert!(matches!(result, Err(CacheError::Embedding(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = CacheConfig::from_toml_str("similarity_threshold = ");
        assert!(matches!(result, Err(CacheError::TomlParse(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("simcache.toml");
        tokio::fs::write(&path, "flush_every = 3\n").await.unwrap();

        let config = CacheConfig::load(&path).await.unwrap();
        assert_eq!(config.flush_every, 3);
    }
}
