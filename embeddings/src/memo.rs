//! Bounded in-process memo of computed embeddings.

use indexmap::IndexMap;

use crate::Embedding;
use crate::fingerprint::Fingerprint;

/// Fingerprint → embedding map with a fixed capacity.
///
/// When full, the oldest inserted entry is evicted. Lookups do not refresh an
/// entry's age. Contents only live as long as the process.
#[derive(Debug, Clone)]
pub struct VectorMemo {
    entries: IndexMap<Fingerprint, Embedding>,
    capacity: usize,
}

impl VectorMemo {
    /// Create an empty memo. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Embedding> {
        self.entries.get(fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Store an embedding, returning the fingerprint evicted to make room.
    pub fn insert(
        &mut self,
        fingerprint: Fingerprint,
        embedding: Embedding,
    ) -> Option<Fingerprint> {
        if let Some(existing) = self.entries.get_mut(&fingerprint) {
            *existing = embedding;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0).map(|(key, _)| key)
        } else {
            None
        };

        self.entries.insert(fingerprint, embedding);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memo_put_get() {
        let mut memo = VectorMemo::new(10);
        let fp = Fingerprint::of("hello");
        memo.insert(fp.clone(), vec![1.0, 2.0, 3.0]);

        assert_eq!(memo.get(&fp), Some(&vec![1.0, 2.0, 3.0]));
        assert!(memo.get(&Fingerprint::of("not cached")).is_none());
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut memo = VectorMemo::new(2);
        memo.insert(Fingerprint::of("a"), vec![1.0]);
        memo.insert(Fingerprint::of("b"), vec![2.0]);

        // Reading "a" does not protect it
        assert!(memo.get(&Fingerprint::of("a")).is_some());

        let evicted = memo.insert(Fingerprint::of("c"), vec![3.0]);
        assert_eq!(evicted, Some(Fingerprint::of("a")));
        assert_eq!(memo.len(), 2);
        assert!(memo.contains(&Fingerprint::of("b")));
        assert!(memo.contains(&Fingerprint::of("c")));
    }

    #[test]
    fn test_reinsert_does_not_evict() {
        let mut memo = VectorMemo::new(2);
        memo.insert(Fingerprint::of("a"), vec![1.0]);
        memo.insert(Fingerprint::of("b"), vec![2.0]);

        assert_eq!(memo.insert(Fingerprint::of("a"), vec![9.0]), None);
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.get(&Fingerprint::of("a")), Some(&vec![9.0]));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut memo = VectorMemo::new(100);
        for i in 0..250 {
            memo.insert(Fingerprint::of(&format!("text {i}")), vec![i as f32]);
            assert!(memo.len() <= 100);
        }
        assert_eq!(memo.len(), 100);
        assert!(!memo.contains(&Fingerprint::of("text 149")));
        assert!(memo.contains(&Fingerprint::of("text 150")));
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let mut memo = VectorMemo::new(0);
        assert_eq!(memo.capacity(), 1);
        assert!(memo.is_empty());

        memo.insert(Fingerprint::of("a"), vec![1.0]);
        assert!(!memo.is_empty());

        memo.clear();
        assert!(memo.is_empty());
        assert!(!memo.contains(&Fingerprint::of("a")));
    }
}
