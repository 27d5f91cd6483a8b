//! The similarity cache facade.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use simcache_embeddings::{
    Embedding, EmbeddingGenerator, Fingerprint, ModelConfig, SimilarityResult, cosine_similarity,
    is_zero,
};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::exact::ExactMatchIndex;
use crate::scan::{LinearScan, SimilarityScanner};
use crate::store::PersistentEmbeddingStore;

/// Maps natural-language queries to previously cached keys by semantic
/// similarity.
///
/// Lookups and mutations never fail: internal errors are logged and turned
/// into a miss (`(None, 0.0)`) or `false`, which callers treat as "recompute
/// the artifact".
pub struct SimilarityCache {
    config: CacheConfig,

    generator: Arc<EmbeddingGenerator>,

    store: RwLock<PersistentEmbeddingStore>,

    exact: RwLock<ExactMatchIndex>,

    scanner: Box<dyn SimilarityScanner>,

    counters: Counters,
}

#[derive(Default)]
struct Counters {
    lookups: AtomicU64,
    shortcut_hits: AtomicU64,
    similarity_hits: AtomicU64,
    misses: AtomicU64,
}

impl SimilarityCache {
    /// Open the cache in `cache_dir`, creating the directory if needed.
    ///
    /// Returns once the embedding generator is ready.
    pub async fn open(cache_dir: impl Into<PathBuf>, similarity_threshold: f32) -> Result<Self> {
        Self::with_config(
            CacheConfig::new(cache_dir).with_similarity_threshold(similarity_threshold),
        )
        .await
    }

    /// Create a new cache builder.
    pub fn builder() -> SimilarityCacheBuilder {
        SimilarityCacheBuilder::new()
    }

    /// Open the cache described by `config`.
    pub async fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let generator = EmbeddingGenerator::initialize(config.embedding.clone()).await;
        Self::with_generator(config, Arc::new(generator)).await
    }

    /// Open the cache over an existing generator, which may be shared.
    pub async fn with_generator(
        config: CacheConfig,
        generator: Arc<EmbeddingGenerator>,
    ) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.cache_dir).await.map_err(|e| {
            CacheError::Persistence(format!("{}: {e}", config.cache_dir.display()))
        })?;

        generator.ensure_ready().await;

        let store = PersistentEmbeddingStore::open(config.store_path(), config.flush_every).await;
        let exact = if config.persist_exact_index {
            ExactMatchIndex::load(&config.exact_index_path()).await
        } else {
            ExactMatchIndex::new()
        };

        info!(
            "Opened similarity cache at {} ({} entries, embedder: {})",
            config.cache_dir.display(),
            store.len(),
            generator.strategy().unwrap_or("unknown"),
        );

        Ok(Self {
            scanner: Box::new(LinearScan::new(config.scan_batch_size)),
            config,
            generator,
            store: RwLock::new(store),
            exact: RwLock::new(exact),
            counters: Counters::default(),
        })
    }

    /// Replace the search strategy.
    pub fn with_scanner(mut self, scanner: Box<dyn SimilarityScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The embedding generator behind this cache.
    pub fn generator(&self) -> &Arc<EmbeddingGenerator> {
        &self.generator
    }

    /// Embed `text`; the zero vector on failure.
    pub async fn embed(&self, text: &str) -> Embedding {
        self.generator.embed(text).await
    }

    /// Cosine similarity clamped to `[0, 1]`.
    pub fn similarity(&self, v1: &[f32], v2: &[f32]) -> f32 {
        cosine_similarity(v1, v2)
    }

    /// Find the cached key whose query is most similar to `query`.
    ///
    /// Returns the key and its score when the best score is strictly greater
    /// than `threshold` (the configured default when `None`), otherwise
    /// `(None, 0.0)`. A repeated query that previously matched above the
    /// shortcut threshold is answered as `(key, 1.0)` without embedding.
    pub async fn find_similar(&self, query: &str, threshold: Option<f32>) -> (Option<String>, f32) {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        let threshold = threshold.unwrap_or(self.config.similarity_threshold);

        let fingerprint = Fingerprint::of(query);
        {
            let store = self.store.read().await;
            if store.is_empty() {
                return self.miss();
            }

            let shortcut = self.exact.read().await.get(&fingerprint).map(str::to_string);
            if let Some(key) = shortcut {
                if store.contains(&key) {
                    self.counters.shortcut_hits.fetch_add(1, Ordering::Relaxed);
                    debug!("Exact-match shortcut hit for {key}");
                    return (Some(key), 1.0);
                }
                debug!("Ignoring stale shortcut to removed key {key}");
            }
        }

        // Embedding may block on the model; no store lock is held meanwhile
        let query_embedding = self.generator.embed(query).await;
        if is_zero(&query_embedding) {
            warn!("Query embedding unavailable, treating lookup as a miss");
            return self.miss();
        }

        let best = {
            let store = self.store.read().await;
            if store.is_empty() {
                return self.miss();
            }
            self.scanner.best_match(&query_embedding, &store).await
        };

        match best {
            Some(best) if best.score > threshold => {
                if best.score > self.config.shortcut_threshold {
                    self.exact
                        .write()
                        .await
                        .insert(fingerprint, best.key.clone());
                }
                self.counters.similarity_hits.fetch_add(1, Ordering::Relaxed);
                debug!("Similar entry {} (score {:.4})", best.key, best.score);
                (Some(best.key), best.score)
            }
            _ => self.miss(),
        }
    }

    fn miss(&self) -> (Option<String>, f32) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        (None, 0.0)
    }

    /// Ranked candidates for `query`, for diagnostics. Does not touch the
    /// shortcut index or the lookup counters.
    pub async fn search(&self, query: &str, k: usize, min_score: f32) -> Vec<SimilarityResult> {
        if k == 0 || self.store.read().await.is_empty() {
            return Vec::new();
        }

        let query_embedding = self.generator.embed(query).await;
        if is_zero(&query_embedding) {
            return Vec::new();
        }

        let store = self.store.read().await;
        self.scanner
            .top_k(&query_embedding, &store, k, min_score)
            .await
    }

    /// Register `query` under `key`, overwriting any previous entry.
    ///
    /// Returns `false` if the query could not be embedded; nothing is stored
    /// in that case.
    pub async fn add(&self, key: &str, query: &str) -> bool {
        let embedding = match self.generator.try_embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                error!("Failed to embed query for cache key {key}: {e}");
                return false;
            }
        };
        if is_zero(&embedding) {
            error!("Refusing to store a zero embedding for cache key {key}");
            return false;
        }

        let flushed = self.store.write().await.insert(key, embedding).await;
        if flushed {
            self.save_exact_index().await;
        }

        debug!("Cached query embedding for {key}");
        true
    }

    /// Re-embed `query` for an existing `key`. Same as [`Self::add`].
    pub async fn update(&self, key: &str, query: &str) -> bool {
        self.add(key, query).await
    }

    /// Remove `key` and flush immediately.
    ///
    /// Shortcuts pointing at `key` are left in place; lookups skip them once
    /// the key is gone. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> bool {
        let removed = self.store.write().await.remove(key).await;
        if removed {
            self.save_exact_index().await;
            debug!("Removed cache key {key}");
        }
        true
    }

    /// Write the store (and shortcuts, if persisted) to disk.
    pub async fn flush(&self) -> bool {
        let saved = match self.store.read().await.save().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to flush similarity cache: {e}");
                false
            }
        };
        self.save_exact_index().await && saved
    }

    /// Drop every entry and shortcut.
    pub async fn clear(&self) -> bool {
        self.exact.write().await.clear();
        let saved = self.store.write().await.clear().await;
        self.save_exact_index().await && saved
    }

    async fn save_exact_index(&self) -> bool {
        if !self.config.persist_exact_index {
            return true;
        }
        match self
            .exact
            .read()
            .await
            .save(&self.config.exact_index_path())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save query shortcuts: {e}");
                false
            }
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains(key)
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.read().await.len(),
            shortcuts: self.exact.read().await.len(),
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            shortcut_hits: self.counters.shortcut_hits.load(Ordering::Relaxed),
            similarity_hits: self.counters.similarity_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            embedder: self.generator.strategy().map(str::to_string),
            dimension: self.generator.dimension(),
            scanner: self.scanner.name().to_string(),
        }
    }
}

/// Builder for [`SimilarityCache`].
pub struct SimilarityCacheBuilder {
    config: CacheConfig,
    generator: Option<Arc<EmbeddingGenerator>>,
    scanner: Option<Box<dyn SimilarityScanner>>,
}

impl SimilarityCacheBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            generator: None,
            scanner: None,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    /// Set the default similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Try this embedding model before falling back to hash embeddings.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.config.embedding.model = Some(model);
        self
    }

    /// Set the memo capacity of the generator.
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.config.embedding.memo_capacity = capacity;
        self
    }

    /// Set how many additions trigger a flush.
    pub fn with_flush_every(mut self, n: usize) -> Self {
        self.config.flush_every = n;
        self
    }

    /// Persist exact-match shortcuts across restarts.
    pub fn with_persist_exact_index(mut self, enabled: bool) -> Self {
        self.config.persist_exact_index = enabled;
        self
    }

    /// Use an existing generator instead of building one.
    pub fn with_generator(mut self, generator: Arc<EmbeddingGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use a custom search strategy.
    pub fn with_scanner(mut self, scanner: Box<dyn SimilarityScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Build the cache.
    pub async fn build(self) -> Result<SimilarityCache> {
        let cache = match self.generator {
            Some(generator) => SimilarityCache::with_generator(self.config, generator).await?,
            None => SimilarityCache::with_config(self.config).await?,
        };
        Ok(match self.scanner {
            Some(scanner) => cache.with_scanner(scanner),
            None => cache,
        })
    }
}

impl Default for SimilarityCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a similarity cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored entries.
    pub entries: usize,

    /// Number of exact-match shortcuts.
    pub shortcuts: usize,

    /// Calls to `find_similar`.
    pub lookups: u64,

    pub shortcut_hits: u64,

    pub similarity_hits: u64,

    pub misses: u64,

    /// Name of the active embedder.
    pub embedder: Option<String>,

    pub dimension: usize,

    pub scanner: String,
}
