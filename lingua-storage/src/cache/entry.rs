//! Cache entries, tag stamps and read results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A tag together with the generation it had when an entry was computed.
///
/// Generations only ever increase. An entry stays live while every stamp's
/// generation still equals the tag's current generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagStamp {
    pub tag: String,
    pub generation: u64,
}

impl TagStamp {
    pub fn new(tag: impl Into<String>, generation: u64) -> Self {
        Self {
            tag: tag.into(),
            generation,
        }
    }

    /// True if the tag has not been invalidated since this stamp was taken.
    pub fn is_current(&self, current_generation: u64) -> bool {
        self.generation == current_generation
    }
}

/// A stored cache value.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Serialized value.
    pub value: Value,
    /// Invalidation tags stamped with their generation.
    pub tags: Vec<TagStamp>,
    /// When the value was stored.
    pub cached_at: DateTime<Utc>,
    /// When the value expires.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry cached now that expires after `ttl`.
    pub fn new(value: Value, tags: Vec<TagStamp>, ttl: Duration) -> Self {
        Self::cached_at(value, tags, Utc::now(), ttl)
    }

    /// Create an entry with an explicit cache time.
    pub fn cached_at(
        value: Value,
        tags: Vec<TagStamp>,
        cached_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            value,
            tags,
            cached_at,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|stamp| stamp.tag == tag)
    }
}

/// Result of a get-or-compute, carrying where the value came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    cached_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// A value served from the cache.
    pub fn from_cache(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            was_cache_hit: true,
        }
    }

    /// A value computed on a miss.
    pub fn from_compute(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    /// Time since the value was cached.
    pub fn staleness(&self) -> Duration {
        (Utc::now() - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Map the value, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheRead<U> {
        CacheRead {
            value: f(self.value),
            cached_at: self.cached_at,
            was_cache_hit: self.was_cache_hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_expiry() {
        let now = Utc::now();
        let entry = CacheEntry::cached_at(json!(1), vec![], now, Duration::from_secs(60));
        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now + chrono::Duration::seconds(59)));
        assert!(entry.is_expired_at(now + chrono::Duration::seconds(60)));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new(json!(null), vec![], Duration::from_secs(u64::MAX));
        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_tags() {
        let entry = CacheEntry::new(
            json!("x"),
            vec![TagStamp::new("children:1", 0), TagStamp::new("view:preview", 3)],
            Duration::from_secs(1),
        );
        assert!(entry.has_tag("children:1"));
        assert!(!entry.has_tag("children:2"));
        assert!(entry.tags[1].is_current(3));
        assert!(!entry.tags[1].is_current(4));
    }

    #[test]
    fn test_cache_read_metadata() {
        let hit = CacheRead::from_cache(5, Utc::now());
        assert!(hit.was_cache_hit());
        let miss = CacheRead::from_compute(5).map(|v| v * 2);
        assert!(miss.was_cache_miss());
        assert_eq!(*miss.value(), 10);
        assert!(miss.staleness() < Duration::from_secs(5));
        assert_eq!(miss.into_value(), 10);
    }
}
