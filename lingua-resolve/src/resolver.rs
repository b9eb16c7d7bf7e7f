//! Translation resolution facade.

use std::sync::Arc;

use lingua_core::{ContentNode, LinguaResult, NodeId, TranslationConfig};
use lingua_storage::{
    children_tag, AdapterStats, CacheBackend, CacheScopeProvider, ContentStore, KeySpace,
    KeyedCache, LocaleSource, NodeAndLocale,
};
use serde::Serialize;

use crate::folder::FolderResolver;
use crate::node::NodeResolver;

/// Counters of the resolver's three caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub translation_node: AdapterStats,
    pub translated_locales: AdapterStats,
    pub translation_folder: AdapterStats,
}

struct Shared<S: ContentStore, B: CacheBackend> {
    store: Arc<S>,
    folders: FolderResolver<S, B>,
    nodes: NodeResolver,
    node_ids: KeyedCache<NodeAndLocale, NodeId, B>,
    locales: KeyedCache<NodeId, Vec<String>, B>,
    config: TranslationConfig,
}

/// Resolves the node serving a locale for a page, and the locales a page is
/// translated into.
///
/// Cloning is cheap: clones share the same caches. Use [`scoped`] to serve a
/// request under a different cache scope (for example preview) without
/// building new caches. Entries computed under one scope are never served
/// under another.
///
/// [`scoped`]: TranslationResolver::scoped
///
/// # Example
///
/// ```ignore
/// let resolver = TranslationResolver::new(
///     store,
///     backend,
///     Arc::new(ViewScopeProvider::published()),
///     TranslationConfig::default(),
/// )?;
///
/// let node = resolver.resolve_translation_node(Some(&page), Some("es-mx")).await?;
/// ```
pub struct TranslationResolver<S: ContentStore, B: CacheBackend> {
    shared: Arc<Shared<S, B>>,
    scope: Arc<dyn CacheScopeProvider>,
}

impl<S: ContentStore, B: CacheBackend> Clone for TranslationResolver<S, B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            scope: Arc::clone(&self.scope),
        }
    }
}

impl<S: ContentStore, B: CacheBackend> TranslationResolver<S, B> {
    /// Build a resolver over a content store and a shared cache backend.
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        store: Arc<S>,
        backend: Arc<B>,
        scope: Arc<dyn CacheScopeProvider>,
        config: TranslationConfig,
    ) -> LinguaResult<Self> {
        config.validate()?;

        let shared = Shared {
            folders: FolderResolver::new(Arc::clone(&store), Arc::clone(&backend), &config),
            nodes: NodeResolver::new(config.locale_field.clone()),
            node_ids: KeyedCache::new(Arc::clone(&backend), KeySpace::TranslationNode)
                .with_single_flight(config.single_flight),
            locales: KeyedCache::new(backend, KeySpace::TranslatedLocales)
                .with_single_flight(config.single_flight),
            store,
            config,
        };
        Ok(Self {
            shared: Arc::new(shared),
            scope,
        })
    }

    /// A resolver sharing these caches under another scope provider.
    pub fn scoped(&self, scope: Arc<dyn CacheScopeProvider>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            scope,
        }
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.shared.config
    }

    /// The node holding `page`'s content in `locale`.
    ///
    /// Returns the first translation node under the page's translation
    /// folder whose locale matches (ignoring case), or the page itself when
    /// there is none. Returns `Ok(None)` without touching any collaborator
    /// when `page` is `None`, and when the resolved node no longer exists in
    /// the store.
    pub async fn resolve_translation_node(
        &self,
        page: Option<&ContentNode>,
        locale: Option<&str>,
    ) -> LinguaResult<Option<ContentNode>> {
        let Some(page) = page else {
            return Ok(None);
        };

        let shared = self.shared.as_ref();
        let scope_tags = self.scope.current_tags();
        let scope_tags = scope_tags.as_slice();

        let read = shared
            .node_ids
            .get_or_compute_scoped(
                &NodeAndLocale::new(page.id, locale),
                scope_tags,
                || async move {
                    let folder = shared.folders.find_translation_folder(page, scope_tags).await?;
                    let translation = folder
                        .as_ref()
                        .and_then(|folder| shared.nodes.find_translation_node(folder, locale))
                        .map(|node| node.id);
                    Ok(translation.unwrap_or(page.id))
                },
                shared.config.node_ttl,
                &[children_tag(page.id)],
            )
            .await?;

        let node_id = *read.value();
        tracing::debug!(
            page_id = %page.id,
            locale = ?locale,
            node_id = %node_id,
            cached = read.was_cache_hit(),
            "Resolved translation node"
        );
        shared.store.get_by_id(node_id).await
    }

    /// [`resolve_translation_node`](Self::resolve_translation_node) for the
    /// locale supplied by `locales`.
    pub async fn resolve_for_current_locale(
        &self,
        page: Option<&ContentNode>,
        locales: &dyn LocaleSource,
    ) -> LinguaResult<Option<ContentNode>> {
        let locale = locales.current_locale();
        self.resolve_translation_node(page, locale.as_deref()).await
    }

    /// Locales `page` has translation nodes for, in child order.
    ///
    /// The page's own locale is not included. Empty when `page` is `None` or
    /// has no translation folder.
    pub async fn list_translated_locales(
        &self,
        page: Option<&ContentNode>,
    ) -> LinguaResult<Vec<String>> {
        let Some(page) = page else {
            return Ok(Vec::new());
        };

        let shared = self.shared.as_ref();
        let scope_tags = self.scope.current_tags();
        let scope_tags = scope_tags.as_slice();

        let read = shared
            .locales
            .get_or_compute_scoped(
                &page.id,
                scope_tags,
                || async move {
                    let folder = shared.folders.find_translation_folder(page, scope_tags).await?;
                    Ok(folder
                        .map(|folder| shared.nodes.list_translated_locales(&folder))
                        .unwrap_or_default())
                },
                shared.config.locales_ttl,
                &[children_tag(page.id)],
            )
            .await?;

        tracing::trace!(
            page_id = %page.id,
            count = read.value().len(),
            cached = read.was_cache_hit(),
            "Listed translated locales"
        );
        Ok(read.into_value())
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            translation_node: self.shared.node_ids.stats(),
            translated_locales: self.shared.locales.stats(),
            translation_folder: self.shared.folders.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_storage::{
        FixedLocale, InMemoryCacheBackend, InMemoryContentStore, StaticScopeProvider,
        ViewScopeProvider,
    };

    fn tree() -> ContentNode {
        ContentNode::new(1, "homePage")
            .with_child(
                ContentNode::new(10, "homePageTranslationFolder")
                    .with_child(ContentNode::new(11, "translation").with_field("language", "es-mx"))
                    .with_child(ContentNode::new(12, "translation").with_field("language", "fr-fr")),
            )
            .with_child(ContentNode::new(2, "article"))
    }

    fn resolver(
        store: Arc<InMemoryContentStore>,
    ) -> TranslationResolver<InMemoryContentStore, InMemoryCacheBackend> {
        TranslationResolver::new(
            store,
            Arc::new(InMemoryCacheBackend::new()),
            Arc::new(StaticScopeProvider::empty()),
            TranslationConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_translation_and_falls_back_to_page() {
        let page = tree();
        let resolver = resolver(Arc::new(InMemoryContentStore::with_roots([page.clone()]).unwrap()));

        let spanish = resolver
            .resolve_translation_node(Some(&page), Some("ES-MX"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(spanish.id, NodeId::new(11));

        let german = resolver
            .resolve_translation_node(Some(&page), Some("de-de"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(german.id, page.id);

        let no_locale = resolver.resolve_translation_node(Some(&page), None).await.unwrap().unwrap();
        assert_eq!(no_locale.id, page.id);
    }

    #[tokio::test]
    async fn test_none_page_resolves_to_none() {
        let resolver = resolver(Arc::new(InMemoryContentStore::new()));
        assert!(resolver.resolve_translation_node(None, Some("en")).await.unwrap().is_none());
        assert!(resolver.list_translated_locales(None).await.unwrap().is_empty());
        assert_eq!(resolver.stats(), ResolverStats::default());
    }

    #[tokio::test]
    async fn test_current_locale_wrapper() {
        let page = tree();
        let resolver = resolver(Arc::new(InMemoryContentStore::with_roots([page.clone()]).unwrap()));

        let node = resolver
            .resolve_for_current_locale(Some(&page), &FixedLocale::new("fr-fr"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.id, NodeId::new(12));

        let node = resolver
            .resolve_for_current_locale(Some(&page), &FixedLocale::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.id, page.id);
    }

    #[tokio::test]
    async fn test_list_translated_locales() {
        let page = tree();
        let article = page.children[1].clone();
        let resolver = resolver(Arc::new(InMemoryContentStore::with_roots([page.clone()]).unwrap()));

        assert_eq!(
            resolver.list_translated_locales(Some(&page)).await.unwrap(),
            vec!["es-mx", "fr-fr"]
        );
        assert!(resolver.list_translated_locales(Some(&article)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let page = tree();
        let resolver = resolver(Arc::new(InMemoryContentStore::with_roots([page.clone()]).unwrap()));

        for _ in 0..2 {
            resolver
                .resolve_translation_node(Some(&page), Some("es-mx"))
                .await
                .unwrap();
        }

        let stats = resolver.stats();
        assert_eq!(stats.translation_node.computations, 1);
        assert_eq!(stats.translation_node.hits, 1);
        assert_eq!(stats.translation_folder.computations, 1);
    }

    #[tokio::test]
    async fn test_folder_cache_is_shared_between_locales_and_lists() {
        let page = tree();
        let resolver = resolver(Arc::new(InMemoryContentStore::with_roots([page.clone()]).unwrap()));

        resolver.resolve_translation_node(Some(&page), Some("es-mx")).await.unwrap();
        resolver.resolve_translation_node(Some(&page), Some("fr-fr")).await.unwrap();
        resolver.list_translated_locales(Some(&page)).await.unwrap();

        let stats = resolver.stats();
        assert_eq!(stats.translation_node.computations, 2);
        assert_eq!(stats.translated_locales.computations, 1);
        assert_eq!(stats.translation_folder.computations, 1);
        assert_eq!(stats.translation_folder.hits, 2);
    }

    #[tokio::test]
    async fn test_preview_results_never_reach_published_requests() {
        let draft = tree();
        let live = ContentNode::new(1, "homePage");
        let backend = Arc::new(InMemoryCacheBackend::new());
        let published = TranslationResolver::new(
            Arc::new(InMemoryContentStore::with_roots([draft.clone()]).unwrap()),
            backend.clone(),
            Arc::new(ViewScopeProvider::published()),
            TranslationConfig::default(),
        )
        .unwrap();
        let preview = published.scoped(Arc::new(ViewScopeProvider::preview()));

        let previewed = preview
            .resolve_translation_node(Some(&draft), Some("es-mx"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(previewed.id, NodeId::new(11));
        assert_eq!(preview.list_translated_locales(Some(&draft)).await.unwrap(), vec!["es-mx", "fr-fr"]);

        // The published snapshot has no translation folder yet.
        let served = published
            .resolve_translation_node(Some(&live), Some("es-mx"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.id, NodeId::new(1));
        assert!(published.list_translated_locales(Some(&live)).await.unwrap().is_empty());

        let stats = published.stats();
        assert_eq!(stats.translation_node.computations, 2);
        assert_eq!(stats.translation_node.hits, 0);
        assert_eq!(stats.translation_folder.computations, 2);

        // Each view keeps serving its own entries.
        preview.resolve_translation_node(Some(&draft), Some("es-mx")).await.unwrap();
        published.resolve_translation_node(Some(&live), Some("es-mx")).await.unwrap();
        assert_eq!(published.stats().translation_node.hits, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = TranslationResolver::new(
            Arc::new(InMemoryContentStore::new()),
            Arc::new(InMemoryCacheBackend::new()),
            Arc::new(StaticScopeProvider::empty()),
            TranslationConfig::default().with_locale_field(" "),
        );
        assert!(result.is_err());
    }
}
