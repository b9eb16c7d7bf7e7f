//! Lingua Storage - Collaborator Traits and Cache Layer
//!
//! Defines the contracts the resolver consumes (content store, dictionary
//! service, locale source, cache backend, cache scope provider), in-memory
//! implementations of each, the typed get-or-compute cache adapter, and the
//! tree invalidation trigger that ties cache entries to tree mutations.

pub mod cache;
pub mod context;
pub mod dictionary;
pub mod invalidation;
pub mod store;

pub use cache::{
    AdapterStats, CacheBackend, CacheEntry, CacheKey, CacheRead, CacheScopeProvider, CacheStats,
    InMemoryCacheBackend, KeySpace, KeyedCache, NodeAndLocale, ScopedKey, StaticScopeProvider,
    TagStamp, ViewMode, ViewScopeProvider,
};
pub use context::{FixedLocale, LocaleSource};
pub use dictionary::{DictionaryItem, DictionaryService, DictionaryTranslation, InMemoryDictionary};
pub use invalidation::{children_tag, TreeChange, TreeInvalidator};
pub use store::{ContentStore, InMemoryContentStore};
