use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::{audio::signature::SongSignature, foundation::error::LyricDanceResult};

/// Song signatures keyed by audio asset, owned by whoever constructs it.
///
/// Bounded by an LRU of `capacity` entries. Failed computations are not stored, so a later call
/// retries them.
#[derive(Debug)]
pub struct AnalysisStore {
    entries: HashMap<String, Arc<SongSignature>>,
    lru: VecDeque<String>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl AnalysisStore {
    /// Entries kept by [`AnalysisStore::default`].
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Empty store holding at most `capacity` signatures (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached signature for `key`.
    pub fn get(&mut self, key: &str) -> Option<Arc<SongSignature>> {
        let found = self.entries.get(key).cloned();
        if found.is_some() {
            self.touch(key);
        }
        found
    }

    /// Store `signature` under `key`, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: impl Into<String>, signature: SongSignature) -> Arc<SongSignature> {
        let key = key.into();
        let sig = Arc::new(signature);
        self.entries.insert(key.clone(), sig.clone());
        self.touch(&key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                tracing::debug!(key = %old, "evicting cached signature");
                self.entries.remove(&old);
            }
        }
        sig
    }

    /// Cached signature for `key`, or the result of `compute` stored under it.
    pub fn get_or_compute<F>(&mut self, key: &str, compute: F) -> LyricDanceResult<Arc<SongSignature>>
    where
        F: FnOnce() -> LyricDanceResult<SongSignature>,
    {
        if let Some(sig) = self.get(key) {
            self.hits += 1;
            return Ok(sig);
        }
        self.misses += 1;
        let sig = compute()?;
        Ok(self.insert(key, sig))
    }

    /// Whether `key` is cached. Does not touch recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached signatures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` of [`AnalysisStore::get_or_compute`] since creation or the last clear.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.hits = 0;
        self.misses = 0;
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.lru.iter().position(|k| k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key.to_owned());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/store.rs"]
mod tests;
