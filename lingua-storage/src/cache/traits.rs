//! Cache backend trait.
//!
//! The backend is the shared, concurrently accessed store behind every
//! logical cache. It owns thread safety, expiry and tag invalidation; the
//! typed get-or-compute contract lives in [`KeyedCache`](super::KeyedCache).

use async_trait::async_trait;
use lingua_core::LinguaResult;

use super::entry::{CacheEntry, TagStamp};
use super::scoped_key::{KeySpace, ScopedKey};

/// Cache backend trait for pluggable cache implementations.
///
/// # Liveness
///
/// `get` must only return entries that are unexpired and whose every
/// [`TagStamp`] matches the tag's current generation. `put` must refuse an
/// entry carrying an outdated stamp: such a value was computed from tree
/// state that has since been invalidated.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live entry.
    async fn get(&self, key: &ScopedKey) -> LinguaResult<Option<CacheEntry>>;

    /// Store an entry, replacing any previous entry for the key.
    ///
    /// Returns `false` if the entry was discarded because one of its tags
    /// was invalidated after it was stamped.
    async fn put(&self, key: ScopedKey, entry: CacheEntry) -> LinguaResult<bool>;

    /// Current generation of each tag, in the order given.
    async fn tag_stamps(&self, tags: &[String]) -> LinguaResult<Vec<TagStamp>>;

    /// Invalidate a tag, killing every entry that carries it.
    ///
    /// Returns the number of entries evicted.
    async fn invalidate_tag(&self, tag: &str) -> LinguaResult<u64>;

    /// Drop every entry of a key space.
    async fn invalidate_space(&self, space: KeySpace) -> LinguaResult<u64>;

    /// Drop expired entries. Returns the number removed.
    async fn purge_expired(&self) -> LinguaResult<u64>;

    /// Get cache statistics.
    async fn stats(&self) -> LinguaResult<CacheStats>;
}

/// Statistics about backend usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently stored.
    pub entry_count: u64,
    /// Entries removed by tag invalidation, expiry, or discarded on put.
    pub evictions: u64,
    /// Number of tag invalidations.
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
