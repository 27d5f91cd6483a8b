//! Durable key → embedding storage.
//!
//! The whole store lives in memory and is mirrored to a single JSON object
//! mapping each cache key to its embedding. The in-memory map is
//! authoritative: a failed write is logged and reconciled by the next
//! successful one.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use simcache_embeddings::Embedding;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::persist::{read_json, write_json};

/// Persistent map from cache key to embedding.
///
/// Iteration follows insertion order; overwriting a key keeps its position.
pub struct PersistentEmbeddingStore {
    /// Backing file.
    path: PathBuf,

    entries: IndexMap<String, Embedding>,

    /// Flush on every n-th addition.
    flush_every: u64,

    /// Additions since the store was opened.
    additions: u64,
}

impl PersistentEmbeddingStore {
    /// Open the store backed by `path`, loading whatever it holds.
    ///
    /// Never fails: a missing or unreadable file yields an empty store.
    pub async fn open(path: impl Into<PathBuf>, flush_every: usize) -> Self {
        let mut store = Self {
            path: path.into(),
            entries: IndexMap::new(),
            flush_every: flush_every.max(1) as u64,
            additions: 0,
        };
        store.load().await;
        store
    }

    /// Replace the in-memory entries with the file's contents.
    pub async fn load(&mut self) {
        self.entries = match read_json::<IndexMap<String, Embedding>>(&self.path).await {
            Ok(Some(entries)) => {
                info!(
                    "Loaded {} embeddings from {}",
                    entries.len(),
                    self.path.display()
                );
                entries
            }
            Ok(None) => {
                debug!("No embedding store at {}, starting empty", self.path.display());
                IndexMap::new()
            }
            Err(e) => {
                error!(
                    "Failed to load embedding store {}, starting empty: {e}",
                    self.path.display()
                );
                IndexMap::new()
            }
        };
    }

    /// Write every entry to the backing file.
    pub async fn save(&self) -> Result<()> {
        write_json(&self.path, &self.entries).await?;
        debug!(
            "Saved {} embeddings to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Save, logging instead of failing. Returns whether the write succeeded.
    async fn flush(&self) -> bool {
        match self.save().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save embedding store {}: {e}", self.path.display());
                false
            }
        }
    }

    /// Insert or overwrite an entry. Returns `true` when this addition
    /// triggered a successful flush.
    pub async fn insert(&mut self, key: impl Into<String>, embedding: Embedding) -> bool {
        self.entries.insert(key.into(), embedding);
        self.additions += 1;

        if self.additions % self.flush_every == 0 {
            self.flush().await
        } else {
            false
        }
    }

    /// Remove an entry and flush immediately. Returns whether it existed.
    pub async fn remove(&mut self, key: &str) -> bool {
        if self.entries.shift_remove(key).is_none() {
            return false;
        }
        self.flush().await;
        true
    }

    /// Drop every entry and flush. Returns whether the flush succeeded.
    pub async fn clear(&mut self) -> bool {
        self.entries.clear();
        info!("Cleared embedding store {}", self.path.display());
        self.flush().await
    }

    pub fn get(&self, key: &str) -> Option<&Embedding> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries
            .iter()
            .map(|(key, embedding)| (key.as_str(), embedding.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Additions since the store was opened.
    pub fn additions(&self) -> u64 {
        self.additions
    }
}
