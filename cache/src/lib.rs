//! # Simcache
//!
//! A semantic similarity cache: maps natural-language queries to previously
//! cached keys so callers can reuse expensive artifacts for paraphrased
//! requests.
//!
//! ## Features
//!
//! - **Similarity lookup**: best match above a threshold, or a miss
//! - **Exact-match shortcuts**: repeated queries skip embedding entirely
//! - **Persistence**: key → embedding mappings survive restarts
//! - **Graceful degradation**: every failure becomes a miss, never an error
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      SimilarityCache                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  query ──► ExactMatchIndex ──(hit)──► (key, 1.0)             │
//! │              │                                               │
//! │            (miss)                                            │
//! │              ▼                                               │
//! │   EmbeddingGenerator ──► SimilarityScanner ──► best match    │
//! │                                 │                            │
//! │                                 ▼                            │
//! │                     PersistentEmbeddingStore                 │
//! │                     (embedding_cache.json)                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> simcache::Result<()> {
//! use simcache::SimilarityCache;
//!
//! let cache = SimilarityCache::open("/tmp/ai_cache", 0.85).await?;
//! cache.add("weather-report", "What is the weather today?").await;
//!
//! let (key, score) = cache.find_similar("What is the weather today?", None).await;
//! assert_eq!(key.as_deref(), Some("weather-report"));
//! assert_eq!(score, 1.0);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod exact;
mod persist;
pub mod scan;
pub mod store;

pub use cache::{CacheStats, SimilarityCache, SimilarityCacheBuilder};
pub use config::{
    CacheConfig, DEFAULT_FLUSH_EVERY, DEFAULT_SCAN_BATCH_SIZE, DEFAULT_SHORTCUT_THRESHOLD,
    DEFAULT_SIMILARITY_THRESHOLD, EMBEDDING_CACHE_FILE, QUERY_HASH_CACHE_FILE,
};
pub use error::{CacheError, Result};
pub use exact::ExactMatchIndex;
pub use scan::{LinearScan, SimilarityScanner};
pub use store::PersistentEmbeddingStore;

pub use simcache_embeddings::{
    Embedder, Embedding, EmbeddingConfig, EmbeddingGenerator, Fingerprint, ModelConfig,
    SimilarityResult, cosine_similarity,
};
