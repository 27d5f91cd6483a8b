//! Deterministic hash-based embeddings.
//!
//! Used when no embedding model can be loaded. The vectors are stable across
//! runs and platforms but carry no semantic meaning: two paraphrases are no
//! closer to each other than two unrelated sentences.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::Embedding;
use crate::error::Result;
use crate::provider::Embedder;

/// Embed `text` by tiling its SHA-256 digest (bytes scaled to `[0, 1]`) up to
/// `dimension` components.
pub fn hash_embedding(text: &str, dimension: usize) -> Embedding {
    let digest = Sha256::digest(text.as_bytes());
    digest
        .iter()
        .map(|byte| f32::from(*byte) / 255.0)
        .cycle()
        .take(dimension)
        .collect()
}

/// Fallback [`Embedder`] backed by [`hash_embedding`].
#[derive(Debug, Clone)]
pub struct HashFallbackEmbedder {
    dimension: usize,
}

impl HashFallbackEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for HashFallbackEmbedder {
    fn name(&self) -> &str {
        "hash-fallback"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_semantic(&self) -> bool {
        false
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(hash_embedding(text, self.dimension))
    }
}
