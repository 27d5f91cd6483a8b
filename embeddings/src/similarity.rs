//! Similarity computation for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Whether every component of `v` is zero. Empty vectors count as zero.
pub fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Compute the cosine similarity between two embeddings, clamped to `[0, 1]`.
///
/// A zero vector carries no information, so anything compared against it
/// scores 0.0 and no division is attempted. Vectors of different lengths
/// also score 0.0. Accumulation happens in `f64` so that a vector compared
/// with itself scores exactly 1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || is_zero(a) || is_zero(b) {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return 0.0;
    }

    score.clamp(0.0, 1.0) as f32
}

/// A scored cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Key of the matched entry.
    pub key: String,

    /// Similarity score.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(key: impl Into<String>, score: f32) -> Self {
        Self {
            key: key.into(),
            score,
        }
    }
}

/// Find the top-k most similar candidates scoring at least `min_score`.
///
/// Candidates with equal scores keep their iteration order.
pub fn find_top_k<'a, I>(
    query: &[f32],
    candidates: I,
    k: usize,
    min_score: f32,
) -> Vec<SimilarityResult>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scores: Vec<(OrderedFloat<f32>, &str)> = candidates
        .into_iter()
        .map(|(key, embedding)| (OrderedFloat(cosine_similarity(query, embedding)), key))
        .filter(|(score, _)| score.0 >= min_score)
        .collect();

    // Stable, so ties stay in candidate order
    scores.sort_by_key(|(score, _)| Reverse(*score));

    scores
        .into_iter()
        .take(k)
        .map(|(score, key)| SimilarityResult::new(key, score.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, 0.1, 0.7, 0.2];
        assert_eq!(cosine_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite_is_clamped() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_zero_vector_never_matches() {
        let zero = vec![0.0; 3];
        let x = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &x), 0.0);
        assert_eq!(cosine_similarity(&x, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_find_top_k() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let c = vec![0.7, 0.7, 0.0];
        let candidates = vec![("a", a.as_slice()), ("b", b.as_slice()), ("c", c.as_slice())];

        let results = find_top_k(&[1.0, 0.0, 0.0], candidates, 2, 0.0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "a");
        assert_eq!(results[1].key, "c");
    }

    #[test]
    fn test_find_top_k_ties_keep_order() {
        let same = vec![0.5, 0.5];
        let candidates = vec![("second", same.as_slice()), ("first", same.as_slice())];

        let results = find_top_k(&[1.0, 1.0], candidates, 2, 0.5);
        let keys: Vec<&str> = results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["second", "first"]);
    }
}
