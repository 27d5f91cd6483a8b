//! The embedding generator.
//!
//! Wraps a single [`Embedder`] chosen once at load time, memoizes results by
//! content fingerprint, and degrades every failure to the zero vector.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, error, info, warn};

use crate::Embedding;
use crate::config::EmbeddingConfig;
use crate::error::Result;
use crate::fallback::HashFallbackEmbedder;
use crate::fingerprint::Fingerprint;
use crate::memo::VectorMemo;
use crate::provider::{Embedder, ModelBackedEmbedder};
use crate::similarity::cosine_similarity;

/// Lifecycle of an [`EmbeddingGenerator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorState {
    Uninitialized,
    Loading,
    Ready,
}

/// Produces fixed-length embeddings for arbitrary text.
///
/// Loading happens at most once: concurrent callers that arrive before the
/// generator is ready all await the same in-flight load. A model that cannot
/// be loaded is replaced by [`HashFallbackEmbedder`] for the lifetime of the
/// generator, so loading never fails.
pub struct EmbeddingGenerator {
    config: EmbeddingConfig,
    embedder: OnceCell<Arc<dyn Embedder>>,
    loading: AtomicBool,
    memo: RwLock<VectorMemo>,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    memo_hits: AtomicU64,
    computed: AtomicU64,
    failures: AtomicU64,
}

impl EmbeddingGenerator {
    /// Create an unloaded generator. The first call to [`Self::embed`] (or
    /// [`Self::ensure_ready`]) performs the load.
    pub fn new(config: EmbeddingConfig) -> Self {
        let memo = VectorMemo::new(config.memo_capacity);
        Self {
            config,
            embedder: OnceCell::new(),
            loading: AtomicBool::new(false),
            memo: RwLock::new(memo),
            counters: Counters::default(),
        }
    }

    /// Create a generator and wait until it is ready.
    pub async fn initialize(config: EmbeddingConfig) -> Self {
        let generator = Self::new(config);
        generator.ensure_ready().await;
        generator
    }

    /// Create a ready generator over an existing embedder.
    pub fn with_embedder(embedder: Arc<dyn Embedder>, memo_capacity: usize) -> Self {
        let config = EmbeddingConfig::default()
            .with_fallback_dimension(embedder.dimension())
            .with_memo_capacity(memo_capacity);
        Self {
            memo: RwLock::new(VectorMemo::new(config.memo_capacity)),
            config,
            embedder: OnceCell::from(embedder),
            loading: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    pub fn state(&self) -> GeneratorState {
        if self.embedder.initialized() {
            GeneratorState::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            GeneratorState::Loading
        } else {
            GeneratorState::Uninitialized
        }
    }

    /// Load the embedder if needed and return it.
    pub async fn ensure_ready(&self) -> &Arc<dyn Embedder> {
        self.embedder
            .get_or_init(|| async {
                let _loading = LoadingFlag::raise(&self.loading);
                load_embedder(&self.config).await
            })
            .await
    }

    /// Length of every embedding this generator returns.
    ///
    /// Before loading completes this is the configured fallback dimension.
    pub fn dimension(&self) -> usize {
        self.embedder
            .get()
            .map_or(self.config.fallback_dimension, |embedder| embedder.dimension())
    }

    /// Name of the active strategy, once loaded.
    pub fn strategy(&self) -> Option<&str> {
        self.embedder.get().map(|embedder| embedder.name())
    }

    /// Whether the active strategy produces semantically meaningful vectors.
    pub fn is_semantic(&self) -> bool {
        self.embedder
            .get()
            .is_some_and(|embedder| embedder.is_semantic())
    }

    /// Embed `text`, returning the zero vector if anything goes wrong.
    pub async fn embed(&self, text: &str) -> Embedding {
        match self.try_embed(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                error!("Embedding generation failed: {e}");
                vec![0.0; self.dimension()]
            }
        }
    }

    /// Embed `text`, surfacing failures. Failed results are not memoized.
    pub async fn try_embed(&self, text: &str) -> Result<Embedding> {
        let embedder = self.ensure_ready().await;
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let fingerprint = Fingerprint::of(text);
        let cached = self.memo.read().await.get(&fingerprint).cloned();
        if let Some(embedding) = cached {
            self.counters.memo_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(embedding);
        }

        let embedding = match embedder.embed(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.counters.computed.fetch_add(1, Ordering::Relaxed);

        if let Some(evicted) = self
            .memo
            .write()
            .await
            .insert(fingerprint, embedding.clone())
        {
            debug!("Evicted memoized embedding {evicted}");
        }

        Ok(embedding)
    }

    /// Cosine similarity clamped to `[0, 1]`.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }

    pub async fn stats(&self) -> GeneratorStats {
        let memo = self.memo.read().await;
        GeneratorStats {
            state: self.state(),
            strategy: self.strategy().map(str::to_string),
            dimension: self.dimension(),
            memo_entries: memo.len(),
            memo_capacity: memo.capacity(),
            requests: self.counters.requests.load(Ordering::Relaxed),
            memo_hits: self.counters.memo_hits.load(Ordering::Relaxed),
            computed: self.counters.computed.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

/// Marks a load as in flight until dropped, including when the loading
/// future is cancelled.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn load_embedder(config: &EmbeddingConfig) -> Arc<dyn Embedder> {
    match &config.model {
        Some(model) => {
            info!("Loading embedding model {} from {}", model.model, model.base_url);
            match ModelBackedEmbedder::load(model.clone()).await {
                Ok(embedder) => return Arc::new(embedder),
                Err(e) => warn!("{e}; falling back to hash embeddings"),
            }
        }
        None => info!("No embedding model configured, using hash embeddings"),
    }

    Arc::new(HashFallbackEmbedder::new(config.fallback_dimension))
}

/// Counters and memo occupancy of a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub state: GeneratorState,

    /// Name of the active embedder.
    pub strategy: Option<String>,

    pub dimension: usize,

    pub memo_entries: usize,

    pub memo_capacity: usize,

    /// Calls to `embed`/`try_embed` after loading.
    pub requests: u64,

    pub memo_hits: u64,

    /// Embeddings actually computed by the embedder.
    pub computed: u64,

    pub failures: u64,
}
