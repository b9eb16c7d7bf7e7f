//! Tagged cache layer.
//!
//! Every logical cache (translation node, translated locales, translation
//! folder, dictionary term) is a [`KeyedCache`] over one shared
//! [`CacheBackend`]. Keys are confined to a [`KeySpace`] so logical caches can
//! share a backend without colliding.
//!
//! # Invalidation
//!
//! Entries carry tags. Each tag has a generation number; an entry records
//! the generation of each of its tags as observed *before* its value was
//! computed ([`TagStamp`]). Invalidating a tag bumps its generation, which
//! kills every entry stamped with an older generation, including entries
//! whose computation was still running when the tag was invalidated.
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(InMemoryCacheBackend::new());
//! let folders: KeyedCache<NodeId, Option<NodeId>, _> =
//!     KeyedCache::new(backend.clone(), KeySpace::TranslationFolder);
//!
//! let read = folders
//!     .get_or_compute(&page_id, || async { Ok(Some(folder_id)) }, ttl, &tags)
//!     .await?;
//! assert!(read.was_cache_miss());
//!
//! backend.invalidate_tag(&children_tag(page_id)).await?;
//! ```

pub mod entry;
pub mod key;
pub mod keyed;
pub mod memory;
pub mod scope;
pub mod scoped_key;
pub mod traits;

pub use entry::{CacheEntry, CacheRead, TagStamp};
pub use key::{CacheKey, NodeAndLocale};
pub use keyed::{AdapterStats, KeyedCache};
pub use memory::InMemoryCacheBackend;
pub use scope::{CacheScopeProvider, StaticScopeProvider, ViewMode, ViewScopeProvider};
pub use scoped_key::{KeySpace, ScopedKey};
pub use traits::{CacheBackend, CacheStats};
