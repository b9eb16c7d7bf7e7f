//! Translation folder lookup.

use std::sync::Arc;
use std::time::Duration;

use lingua_core::{invariant_eq, ContentNode, LinguaResult, NodeId, TranslationConfig};
use lingua_storage::{
    children_tag, AdapterStats, CacheBackend, ContentStore, KeySpace, KeyedCache,
};

/// Find the translation folder of `page` among its direct children.
///
/// The folder is the first child, in child order, whose type alias equals
/// `page.type_alias + suffix` ignoring case.
pub fn locate_translation_folder<'a>(
    page: &'a ContentNode,
    suffix: &str,
) -> Option<&'a ContentNode> {
    let folder_type = format!("{}{}", page.type_alias, suffix);
    page.children
        .iter()
        .find(|child| invariant_eq(&child.type_alias, &folder_type))
}

/// Cached translation folder lookup, keyed by page id.
///
/// Only the folder's id is cached; the folder itself is re-read from the
/// content store on every call so its children are current.
pub struct FolderResolver<S: ContentStore, B: CacheBackend> {
    store: Arc<S>,
    cache: KeyedCache<NodeId, Option<NodeId>, B>,
    suffix: String,
    ttl: Duration,
}

impl<S: ContentStore, B: CacheBackend> FolderResolver<S, B> {
    pub fn new(store: Arc<S>, backend: Arc<B>, config: &TranslationConfig) -> Self {
        Self {
            store,
            cache: KeyedCache::new(backend, KeySpace::TranslationFolder)
                .with_single_flight(config.single_flight),
            suffix: config.folder_suffix.clone(),
            ttl: config.folder_ttl,
        }
    }

    /// The translation folder of `page`, if it has one.
    ///
    /// The entry is cached under `scope_tags` and tagged with the page's
    /// children tag.
    pub async fn find_translation_folder(
        &self,
        page: &ContentNode,
        scope_tags: &[String],
    ) -> LinguaResult<Option<ContentNode>> {
        let suffix = self.suffix.as_str();
        let folder_id = self
            .cache
            .get_or_compute_scoped(
                &page.id,
                scope_tags,
                || async move {
                    let folder = locate_translation_folder(page, suffix).map(|f| f.id);
                    tracing::trace!(page_id = %page.id, folder = ?folder, "Located translation folder");
                    Ok(folder)
                },
                self.ttl,
                &[children_tag(page.id)],
            )
            .await?
            .into_value();

        match folder_id {
            Some(id) => self.store.get_by_id(id).await,
            None => Ok(None),
        }
    }

    pub fn stats(&self) -> AdapterStats {
        self.cache.stats()
    }
}
