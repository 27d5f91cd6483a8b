//! Similarity search over the store.
//!
//! [`SimilarityScanner`] is the seam between the cache facade and the search
//! strategy. [`LinearScan`] compares the query against every entry, which is
//! fine for small caches and degrades linearly with store size.

use async_trait::async_trait;
use simcache_embeddings::{SimilarityResult, cosine_similarity, find_top_k};

use crate::store::PersistentEmbeddingStore;

#[async_trait]
pub trait SimilarityScanner: Send + Sync {
    fn name(&self) -> &str;

    /// The highest-scoring entry, whatever its score. Among equal scores the
    /// first entry in store order wins. `None` only for an empty store.
    async fn best_match(
        &self,
        query: &[f32],
        store: &PersistentEmbeddingStore,
    ) -> Option<SimilarityResult>;

    /// Up to `k` entries scoring at least `min_score`, best first.
    async fn top_k(
        &self,
        query: &[f32],
        store: &PersistentEmbeddingStore,
        k: usize,
        min_score: f32,
    ) -> Vec<SimilarityResult>;
}

/// Exhaustive scan that yields to the scheduler between batches.
#[derive(Debug, Clone)]
pub struct LinearScan {
    batch_size: usize,
}

impl LinearScan {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl SimilarityScanner for LinearScan {
    fn name(&self) -> &str {
        "linear"
    }

    async fn best_match(
        &self,
        query: &[f32],
        store: &PersistentEmbeddingStore,
    ) -> Option<SimilarityResult> {
        let mut best: Option<(&str, f32)> = None;

        for (i, (key, embedding)) in store.iter().enumerate() {
            if i > 0 && i % self.batch_size == 0 {
                tokio::task::yield_now().await;
            }

            let score = cosine_similarity(query, embedding);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((key, score));
            }
        }

        best.map(|(key, score)| SimilarityResult::new(key, score))
    }

    async fn top_k(
        &self,
        query: &[f32],
        store: &PersistentEmbeddingStore,
        k: usize,
        min_score: f32,
    ) -> Vec<SimilarityResult> {
        find_top_k(query, store.iter(), k, min_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn store_with(entries: &[(&str, Vec<f32>)]) -> (TempDir, PersistentEmbeddingStore) {
        let dir = TempDir::new().unwrap();
        let mut store =
            PersistentEmbeddingStore::open(dir.path().join("embedding_cache.json"), 1000).await;
        for (key, embedding) in entries {
            store.insert(*key, embedding.clone()).await;
        }
        (dir, store)
    }

    #[tokio::test]
    async fn test_best_match() {
        let (_dir, store) = store_with(&[
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.0, 1.0, 0.0]),
            ("c", vec![0.7, 0.7, 0.0]),
        ])
        .await;

        let best = LinearScan::new(2)
            .best_match(&[0.6, 0.8, 0.0], &store)
            .await
            .unwrap();
        assert_eq!(best.key, "c");
    }

    #[tokio::test]
    async fn test_first_of_equal_scores_wins() {
        let (_dir, store) = store_with(&[
            ("first", vec![1.0, 0.0]),
            ("other", vec![0.0, 1.0]),
            ("second", vec![2.0, 0.0]),
        ])
        .await;

        let best = LinearScan::new(1)
            .best_match(&[1.0, 0.0], &store)
            .await
            .unwrap();
        assert_eq!(best, SimilarityResult::new("first", 1.0));
    }

    #[tokio::test]
    async fn test_empty_store_has_no_match() {
        let (_dir, store) = store_with(&[]).await;
        assert!(LinearScan::new(50).best_match(&[1.0], &store).await.is_none());
    }

    #[tokio::test]
    async fn test_best_match_reports_low_scores() {
        let (_dir, store) = store_with(&[("a", vec![0.0, 1.0])]).await;
        let best = LinearScan::new(50)
            .best_match(&[1.0, 0.0], &store)
            .await
            .unwrap();
        assert_eq!(best.key, "a");
        assert!(best.score < 1e-6);
    }

    #[tokio::test]
    async fn test_top_k() {
        let (_dir, store) = store_with(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.0, 1.0]),
            ("c", vec![0.8, 0.6]),
        ])
        .await;

        let results = LinearScan::new(50).top_k(&[1.0, 0.0], &store, 5, 0.5).await;
        let keys: Vec<&str> = results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
