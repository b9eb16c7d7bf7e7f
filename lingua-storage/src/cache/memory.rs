//! In-memory cache backend.

use async_trait::async_trait;
use chrono::Utc;
use lingua_core::LinguaResult;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::entry::{CacheEntry, TagStamp};
use super::scoped_key::{KeySpace, ScopedKey};
use super::traits::{CacheBackend, CacheStats};

/// Process-local cache backend.
///
/// Entries, tag generations and the tag -> keys index live behind one
/// `tokio::sync::RwLock`. Reads take the read lock only; dead entries found
/// on read are left for the next write or `purge_expired` to remove.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    state: RwLock<BackendState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default)]
struct BackendState {
    entries: HashMap<ScopedKey, CacheEntry>,
    generations: HashMap<String, u64>,
    tag_index: HashMap<String, HashSet<ScopedKey>>,
    evictions: u64,
    invalidations: u64,
}

impl BackendState {
    fn generation(&self, tag: &str) -> u64 {
        self.generations.get(tag).copied().unwrap_or(0)
    }

    fn is_current(&self, stamps: &[TagStamp]) -> bool {
        stamps
            .iter()
            .all(|stamp| stamp.is_current(self.generation(&stamp.tag)))
    }

    fn unindex(&mut self, key: &ScopedKey, entry: &CacheEntry) {
        for stamp in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(&stamp.tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(&stamp.tag);
                }
            }
        }
    }

    fn remove(&mut self, key: &ScopedKey) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.unindex(key, &entry);
                true
            }
            None => false,
        }
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&ScopedKey, &CacheEntry) -> bool) -> u64 {
        let doomed: Vec<ScopedKey> = self
            .entries
            .iter()
            .filter(|(key, entry)| predicate(key, entry))
            .map(|(key, _)| key.clone())
            .collect();
        let removed = doomed.iter().filter(|key| self.remove(key)).count() as u64;
        self.evictions += removed;
        removed
    }
}

impl InMemoryCacheBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, live or not yet purged.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current generation of a tag.
    pub async fn generation(&self, tag: &str) -> u64 {
        self.state.read().await.generation(tag)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &ScopedKey) -> LinguaResult<Option<CacheEntry>> {
        let state = self.state.read().await;
        let live = state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(Utc::now()) && state.is_current(&entry.tags))
            .cloned();

        match live {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(live)
    }

    async fn put(&self, key: ScopedKey, entry: CacheEntry) -> LinguaResult<bool> {
        let mut state = self.state.write().await;
        if !state.is_current(&entry.tags) {
            state.evictions += 1;
            tracing::debug!(key = %key, "Discarded cache entry invalidated during computation");
            return Ok(false);
        }

        state.remove(&key);
        for stamp in &entry.tags {
            state
                .tag_index
                .entry(stamp.tag.clone())
                .or_default()
                .insert(key.clone());
        }
        state.entries.insert(key, entry);
        Ok(true)
    }

    async fn tag_stamps(&self, tags: &[String]) -> LinguaResult<Vec<TagStamp>> {
        let state = self.state.read().await;
        Ok(tags
            .iter()
            .map(|tag| TagStamp::new(tag.clone(), state.generation(tag)))
            .collect())
    }

    async fn invalidate_tag(&self, tag: &str) -> LinguaResult<u64> {
        let mut state = self.state.write().await;
        *state.generations.entry(tag.to_string()).or_insert(0) += 1;
        state.invalidations += 1;

        let keys: Vec<ScopedKey> = state
            .tag_index
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        let evicted = keys.iter().filter(|key| state.remove(key)).count() as u64;
        state.evictions += evicted;

        tracing::trace!(tag, evicted, "Invalidated cache tag");
        Ok(evicted)
    }

    async fn invalidate_space(&self, space: KeySpace) -> LinguaResult<u64> {
        let mut state = self.state.write().await;
        let removed = state.remove_where(|key, _| key.space() == space);
        tracing::debug!(space = %space, removed, "Invalidated cache key space");
        Ok(removed)
    }

    async fn purge_expired(&self) -> LinguaResult<u64> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        Ok(state.remove_where(|_, entry| entry.is_expired_at(now)))
    }

    async fn stats(&self) -> LinguaResult<CacheStats> {
        let state = self.state.read().await;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: state.entries.len() as u64,
            evictions: state.evictions,
            invalidations: state.invalidations,
        })
    }
}
