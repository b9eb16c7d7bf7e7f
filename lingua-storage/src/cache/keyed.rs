//! Typed get-or-compute adapter over a shared backend.
//!
//! This module implements the core caching contract: return the cached value
//! for a key without computing, or compute once, store with a TTL and
//! invalidation tags, and return the computed value.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lingua_core::{CacheError, LinguaResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::entry::{CacheEntry, CacheRead};
use super::key::CacheKey;
use super::scoped_key::{KeySpace, ScopedKey};
use super::traits::CacheBackend;

/// Per-adapter counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    /// Lookups answered from the backend.
    pub hits: u64,
    /// Lookups that found no live entry.
    pub misses: u64,
    /// Times the compute function actually ran.
    pub computations: u64,
}

impl AdapterStats {
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

type Gate = Arc<tokio::sync::Mutex<()>>;
type InFlight = Mutex<HashMap<ScopedKey, Gate>>;

/// A caller's membership in the queue for one key.
///
/// Dropping it leaves the queue, removing the key's gate once the last
/// member is gone, including when the owning future is cancelled.
struct Flight<'c> {
    in_flight: &'c InFlight,
    key: ScopedKey,
    gate: Gate,
}

impl<'c> Flight<'c> {
    fn join(in_flight: &'c InFlight, key: ScopedKey) -> LinguaResult<Self> {
        let gate = {
            let mut map = in_flight.lock().map_err(|_| CacheError::LockPoisoned)?;
            Arc::clone(map.entry(key.clone()).or_default())
        };
        Ok(Self {
            in_flight,
            key,
            gate,
        })
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let gate = std::mem::take(&mut self.gate);
        let mut map = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken and dropped under this lock, so the last
        // member out sees the map's reference as the only other one.
        let last_out = map
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2);
        drop(gate);
        if last_out {
            map.remove(&self.key);
        }
    }
}

/// One logical cache: keys of type `K` mapped to values of type `V`, stored
/// in key space `space` of a shared backend.
///
/// Lookups may be confined to a request scope with
/// [`get_or_compute_scoped`](Self::get_or_compute_scoped): the same key under
/// different scopes names different entries.
///
/// Values are stored as JSON, so "no result" values such as `None` or an
/// empty `Vec` are cached exactly like any other value.
///
/// # Single-flight
///
/// With single-flight enabled (the default), concurrent misses on the same
/// key queue behind the first caller; once it has stored its value they are
/// served from the cache instead of computing again. Misses on different
/// keys never wait on each other. Redundant computation can still happen if
/// the first value is discarded by a concurrent invalidation, which is safe
/// because compute functions only read tree state.
pub struct KeyedCache<K, V, B>
where
    B: CacheBackend,
{
    backend: Arc<B>,
    space: KeySpace,
    single_flight: bool,
    in_flight: InFlight,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
    _types: PhantomData<fn(K) -> V>,
}

impl<K, V, B> KeyedCache<K, V, B>
where
    K: CacheKey,
    V: Serialize + DeserializeOwned + Send,
    B: CacheBackend,
{
    /// Create an adapter for one key space of a shared backend.
    pub fn new(backend: Arc<B>, space: KeySpace) -> Self {
        Self {
            backend,
            space,
            single_flight: true,
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            computations: AtomicU64::new(0),
            _types: PhantomData,
        }
    }

    /// Enable or disable single-flight computation.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn space(&self) -> KeySpace {
        self.space
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of this adapter's counters.
    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// `tags` are stamped with their current generation before `compute`
    /// runs; invalidating any of them afterwards makes the stored entry dead.
    /// Errors from the backend or from `compute` propagate unchanged and
    /// nothing is stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &K,
        compute: F,
        ttl: Duration,
        tags: &[String],
    ) -> LinguaResult<CacheRead<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LinguaResult<V>>,
    {
        self.get_or_compute_scoped(key, &[], compute, ttl, tags).await
    }

    /// [`get_or_compute`](Self::get_or_compute) confined to a request scope.
    ///
    /// `scope` is part of the entry's identity, so a value computed under
    /// one scope is never served under another. The scope tags are stamped
    /// on the entry along with `tags`.
    pub async fn get_or_compute_scoped<F, Fut>(
        &self,
        key: &K,
        scope: &[String],
        compute: F,
        ttl: Duration,
        tags: &[String],
    ) -> LinguaResult<CacheRead<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LinguaResult<V>>,
    {
        let scoped = ScopedKey::new(self.space, key).with_scope(scope);
        let mut stamped = scope.to_vec();
        stamped.extend(tags.iter().filter(|tag| !scope.contains(tag)).cloned());

        if let Some(hit) = self.lookup(&scoped).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %scoped, "Cache hit");
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(key = %scoped, "Cache miss");

        if !self.single_flight {
            return self.compute_and_store(scoped, compute, ttl, &stamped).await;
        }

        let flight = Flight::join(&self.in_flight, scoped.clone())?;
        let _turn = flight.gate.lock().await;
        // Another caller may have filled the entry while we waited.
        match self.lookup(&scoped).await? {
            Some(filled) => Ok(filled),
            None => self.compute_and_store(scoped, compute, ttl, &stamped).await,
        }
    }

    /// Drop every entry of this adapter's key space.
    pub async fn clear(&self) -> LinguaResult<u64> {
        self.backend.invalidate_space(self.space).await
    }

    async fn lookup(&self, scoped: &ScopedKey) -> LinguaResult<Option<CacheRead<V>>> {
        match self.backend.get(scoped).await? {
            Some(entry) => {
                let value: V = serde_json::from_value(entry.value).map_err(|e| {
                    CacheError::Serialization {
                        space: self.space.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(CacheRead::from_cache(value, entry.cached_at)))
            }
            None => Ok(None),
        }
    }

    async fn compute_and_store<F, Fut>(
        &self,
        scoped: ScopedKey,
        compute: F,
        ttl: Duration,
        tags: &[String],
    ) -> LinguaResult<CacheRead<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LinguaResult<V>>,
    {
        let stamps = self.backend.tag_stamps(tags).await?;

        self.computations.fetch_add(1, Ordering::Relaxed);
        let value = compute().await?;

        let encoded = serde_json::to_value(&value).map_err(|e| CacheError::Serialization {
            space: self.space.to_string(),
            reason: e.to_string(),
        })?;
        let stored = self
            .backend
            .put(scoped.clone(), CacheEntry::new(encoded, stamps, ttl))
            .await?;
        if !stored {
            tracing::debug!(
                space = %self.space,
                key = %scoped.key(),
                "Computed value outlived an invalidation and was not cached"
            );
        }

        Ok(CacheRead::from_compute(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::NodeAndLocale;
    use crate::cache::memory::InMemoryCacheBackend;
    use lingua_core::{LinguaError, NodeId, StoreError};
    use std::sync::atomic::AtomicUsize;

    const TTL: Duration = Duration::from_secs(3600);

    fn node_cache(
        backend: Arc<InMemoryCacheBackend>,
    ) -> KeyedCache<NodeAndLocale, NodeId, InMemoryCacheBackend> {
        KeyedCache::new(backend, KeySpace::TranslationNode)
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_miss_computes_then_hit_skips_compute() {
        let cache = node_cache(Arc::new(InMemoryCacheBackend::new()));
        let key = NodeAndLocale::new(NodeId::new(1), Some("es-mx"));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let counter = &calls;
            let read = cache
                .get_or_compute(
                    &key,
                    || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(NodeId::new(12))
                    },
                    TTL,
                    &tags(&["children:1"]),
                )
                .await
                .unwrap();
            assert_eq!(*read.value(), NodeId::new(12));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.computations, 1);
    }

    #[tokio::test]
    async fn test_empty_results_are_cached() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache: KeyedCache<NodeId, Vec<String>, _> =
            KeyedCache::new(backend, KeySpace::TranslatedLocales);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let counter = &calls;
            let read = cache
                .get_or_compute(
                    &NodeId::new(3),
                    || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(Vec::new())
                    },
                    TTL,
                    &[],
                )
                .await
                .unwrap();
            assert!(read.value().is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tag_invalidation_forces_recompute() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = node_cache(backend.clone());
        let key = NodeAndLocale::new(NodeId::new(1), Some("en"));
        let tag_set = tags(&["children:1"]);

        let first = cache
            .get_or_compute(&key, || async { Ok(NodeId::new(1)) }, TTL, &tag_set)
            .await
            .unwrap();
        assert!(first.was_cache_miss());

        backend.invalidate_tag("children:1").await.unwrap();

        let second = cache
            .get_or_compute(&key, || async { Ok(NodeId::new(40)) }, TTL, &tag_set)
            .await
            .unwrap();
        assert!(second.was_cache_miss());
        assert_eq!(second.into_value(), NodeId::new(40));
        assert_eq!(cache.stats().computations, 2);
    }

    #[tokio::test]
    async fn test_key_spaces_do_not_collide() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let folders: KeyedCache<NodeId, Option<NodeId>, _> =
            KeyedCache::new(backend.clone(), KeySpace::TranslationFolder);
        let locales: KeyedCache<NodeId, Vec<String>, _> =
            KeyedCache::new(backend, KeySpace::TranslatedLocales);
        let page = NodeId::new(7);

        folders
            .get_or_compute(&page, || async { Ok(Some(NodeId::new(8))) }, TTL, &[])
            .await
            .unwrap();
        let read = locales
            .get_or_compute(&page, || async { Ok(vec!["es-mx".to_string()]) }, TTL, &[])
            .await
            .unwrap();

        assert!(read.was_cache_miss());
        assert_eq!(read.into_value(), vec!["es-mx".to_string()]);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_and_is_not_cached() {
        let cache = node_cache(Arc::new(InMemoryCacheBackend::new()));
        let key = NodeAndLocale::new(NodeId::new(1), Some("en"));

        let failed = cache
            .get_or_compute(
                &key,
                || async {
                    Err(StoreError::Unavailable {
                        reason: "offline".to_string(),
                    }
                    .into())
                },
                TTL,
                &[],
            )
            .await;
        assert!(matches!(failed, Err(LinguaError::Store(StoreError::Unavailable { .. }))));

        let retried = cache
            .get_or_compute(&key, || async { Ok(NodeId::new(2)) }, TTL, &[])
            .await
            .unwrap();
        assert!(retried.was_cache_miss());
        assert_eq!(cache.stats().computations, 2);
    }

    #[tokio::test]
    async fn test_cached_value_of_wrong_shape_is_a_serialization_error() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let as_list: KeyedCache<NodeId, Vec<String>, _> =
            KeyedCache::new(backend.clone(), KeySpace::TranslatedLocales);
        let as_id: KeyedCache<NodeId, NodeId, _> =
            KeyedCache::new(backend, KeySpace::TranslatedLocales);

        as_list
            .get_or_compute(&NodeId::new(1), || async { Ok(vec!["x".to_string()]) }, TTL, &[])
            .await
            .unwrap();
        let result = as_id
            .get_or_compute(&NodeId::new(1), || async { Ok(NodeId::new(1)) }, TTL, &[])
            .await;
        assert!(matches!(
            result,
            Err(LinguaError::Cache(CacheError::Serialization { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_collapses_concurrent_misses() {
        let cache = Arc::new(node_cache(Arc::new(InMemoryCacheBackend::new())));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = NodeAndLocale::new(NodeId::new(1), Some("es-mx"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(
                        &key,
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(NodeId::new(12))
                        },
                        TTL,
                        &[],
                    )
                    .await
                    .map(CacheRead::into_value)
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), NodeId::new(12));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scopes_keep_entries_apart() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let cache = node_cache(backend.clone());
        let key = NodeAndLocale::new(NodeId::new(1), Some("es-mx"));
        let preview = tags(&["view:preview"]);
        let published = tags(&["view:published"]);

        let draft = cache
            .get_or_compute_scoped(&key, &preview, || async { Ok(NodeId::new(11)) }, TTL, &[])
            .await
            .unwrap();
        let live = cache
            .get_or_compute_scoped(&key, &published, || async { Ok(NodeId::new(1)) }, TTL, &[])
            .await
            .unwrap();
        assert!(live.was_cache_miss());
        assert_eq!(draft.into_value(), NodeId::new(11));
        assert_eq!(live.into_value(), NodeId::new(1));

        let again = cache
            .get_or_compute_scoped(&key, &published, || async { Ok(NodeId::new(99)) }, TTL, &[])
            .await
            .unwrap();
        assert!(again.was_cache_hit());
        assert_eq!(again.into_value(), NodeId::new(1));
        assert_eq!(cache.stats().computations, 2);

        // The scope tag still invalidates its own entries only.
        assert_eq!(backend.invalidate_tag("view:preview").await.unwrap(), 1);
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancelled_computation_leaves_no_gate_behind() {
        let cache = node_cache(Arc::new(InMemoryCacheBackend::new()));
        let key = NodeAndLocale::new(NodeId::new(1), Some("es-mx"));

        let slow = cache.get_or_compute(
            &key,
            || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(NodeId::new(11))
            },
            TTL,
            &[],
        );
        let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
        assert!(timed_out.is_err());
        assert!(cache.in_flight.lock().unwrap().is_empty());

        let read = cache
            .get_or_compute(&key, || async { Ok(NodeId::new(12)) }, TTL, &[])
            .await
            .unwrap();
        assert_eq!(read.into_value(), NodeId::new(12));
    }

    #[tokio::test]
    async fn test_without_single_flight_still_caches() {
        let cache = node_cache(Arc::new(InMemoryCacheBackend::new())).with_single_flight(false);
        let key = NodeAndLocale::new(NodeId::new(1), None);

        cache
            .get_or_compute(&key, || async { Ok(NodeId::new(1)) }, TTL, &[])
            .await
            .unwrap();
        let read = cache
            .get_or_compute(&key, || async { Ok(NodeId::new(99)) }, TTL, &[])
            .await
            .unwrap();
        assert!(read.was_cache_hit());
        assert_eq!(read.into_value(), NodeId::new(1));
    }
}
