//! Exact-match shortcuts: query fingerprint → cache key.
//!
//! An entry is only recorded after a similarity match scored above the
//! shortcut threshold, so repeating that exact query skips embedding and
//! scanning. Entries may go stale when their key is removed from the store;
//! callers must check the key still exists before trusting a hit.

use std::collections::HashMap;
use std::path::Path;

use simcache_embeddings::Fingerprint;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::persist::{read_json, write_json};

#[derive(Debug, Default, Clone)]
pub struct ExactMatchIndex {
    entries: HashMap<Fingerprint, String>,
}

impl ExactMatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load shortcuts from `path`. Missing or unreadable files yield an empty
    /// index.
    pub async fn load(path: &Path) -> Self {
        match read_json::<HashMap<Fingerprint, String>>(path).await {
            Ok(Some(entries)) => {
                info!("Loaded {} query shortcuts from {}", entries.len(), path.display());
                Self { entries }
            }
            Ok(None) => Self::new(),
            Err(e) => {
                error!("Failed to load query shortcuts {}: {e}", path.display());
                Self::new()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.entries).await?;
        debug!("Saved {} query shortcuts", self.entries.len());
        Ok(())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&str> {
        self.entries.get(fingerprint).map(String::as_str)
    }

    pub fn insert(&mut self, fingerprint: Fingerprint, key: impl Into<String>) {
        self.entries.insert(fingerprint, key.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
