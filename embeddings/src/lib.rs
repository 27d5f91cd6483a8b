//! # Embeddings
//!
//! Text embedding generation for the similarity cache.
//!
//! ## Features
//!
//! - **Model-backed embeddings**: any OpenAI-compatible `/embeddings` endpoint
//! - **Hash fallback**: deterministic, non-semantic vectors when no model loads
//! - **Memoization**: a bounded in-process memo keyed by content fingerprint
//! - **Similarity**: cosine similarity clamped to `[0, 1]`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     EmbeddingGenerator                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Fingerprint ──► VectorMemo ──(miss)──► dyn Embedder            │
//! │                                            │                    │
//! │                               ┌────────────┴───────────┐        │
//! │                               ▼                        ▼        │
//! │                     ModelBackedEmbedder     HashFallbackEmbedder│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod fingerprint;
pub mod generator;
pub mod memo;
pub mod provider;
pub mod similarity;

pub use config::{DEFAULT_DIMENSION, DEFAULT_MEMO_CAPACITY, EmbeddingConfig, ModelConfig};
pub use error::{EmbeddingError, Result};
pub use fallback::{HashFallbackEmbedder, hash_embedding};
pub use fingerprint::Fingerprint;
pub use generator::{EmbeddingGenerator, GeneratorState, GeneratorStats};
pub use memo::VectorMemo;
pub use provider::{Embedder, ModelBackedEmbedder};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k, is_zero};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
