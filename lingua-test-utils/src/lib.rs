//! Lingua Test Utilities
//!
//! Shared test infrastructure for the lingua workspace:
//! - A fixture content tree with translated and untranslated pages
//! - Counting collaborator wrappers that can be switched to fail
//! - Proptest generators for locales and translation folders
//! - Tracing initialisation for tests

pub use lingua_core::{ContentNode, LinguaError, LinguaResult, NodeId, StoreError};
pub use lingua_storage::{
    ContentStore, DictionaryItem, DictionaryService, InMemoryCacheBackend, InMemoryContentStore,
    InMemoryDictionary,
};

use async_trait::async_trait;
use lingua_core::DictionaryError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! A small site used across resolver tests.
    //!
    //! ```text
    //! 1  homePage
    //! ├── 10 homePageTranslationFolder
    //! │   ├── 11 translation  language = "es-mx"
    //! │   ├── 12 translation  language = "fr-fr"
    //! │   ├── 13 translation  (no language)
    //! │   └── 14 translation  language = "ES-MX"
    //! ├── 2  article
    //! │   └── 20 articleBody
    //! └── 3  landingPage
    //!     └── 30 landingPageTranslationFolder (empty)
    //! ```

    use super::*;

    pub const HOME: NodeId = NodeId::new(1);
    pub const HOME_FOLDER: NodeId = NodeId::new(10);
    pub const SPANISH: NodeId = NodeId::new(11);
    pub const FRENCH: NodeId = NodeId::new(12);
    pub const UNLABELLED: NodeId = NodeId::new(13);
    pub const SPANISH_DUPLICATE: NodeId = NodeId::new(14);
    pub const ARTICLE: NodeId = NodeId::new(2);
    pub const LANDING: NodeId = NodeId::new(3);
    pub const LANDING_FOLDER: NodeId = NodeId::new(30);

    /// A translation node with the default locale field.
    pub fn translation(id: i64, locale: &str) -> ContentNode {
        ContentNode::new(id, "translation").with_field("language", locale)
    }

    /// A page whose translation folder holds one translation per locale.
    ///
    /// The folder gets id `page_id * 10` and translations follow it.
    pub fn page_with_translations(page_id: i64, type_alias: &str, locales: &[&str]) -> ContentNode {
        let folder_id = page_id * 10;
        let folder = locales.iter().enumerate().fold(
            ContentNode::new(folder_id, format!("{}TranslationFolder", type_alias)),
            |folder, (i, locale)| folder.with_child(translation(folder_id + 1 + i as i64, locale)),
        );
        ContentNode::new(page_id, type_alias).with_child(folder)
    }

    /// The fixture site as one subtree.
    pub fn translated_site() -> ContentNode {
        ContentNode::new(HOME.get(), "homePage")
            .with_child(
                ContentNode::new(HOME_FOLDER.get(), "homePageTranslationFolder")
                    .with_child(translation(SPANISH.get(), "es-mx"))
                    .with_child(translation(FRENCH.get(), "fr-fr"))
                    .with_child(ContentNode::new(UNLABELLED.get(), "translation"))
                    .with_child(translation(SPANISH_DUPLICATE.get(), "ES-MX")),
            )
            .with_child(
                ContentNode::new(ARTICLE.get(), "article")
                    .with_child(ContentNode::new(20, "articleBody")),
            )
            .with_child(
                ContentNode::new(LANDING.get(), "landingPage").with_child(ContentNode::new(
                    LANDING_FOLDER.get(),
                    "landingPageTranslationFolder",
                )),
            )
    }

    /// An in-memory store holding [`translated_site`].
    pub fn site_store() -> Arc<InMemoryContentStore> {
        let store = InMemoryContentStore::new();
        store
            .insert(None, translated_site())
            .unwrap_or_else(|e| panic!("fixture site must insert: {e}"));
        Arc::new(store)
    }

    /// A dictionary with a greeting in English and Spanish.
    pub fn greeting_dictionary() -> Arc<InMemoryDictionary> {
        let dictionary = InMemoryDictionary::new();
        dictionary
            .insert(
                DictionaryItem::new("greeting")
                    .with_translation("en-US", "Hello")
                    .with_translation("es-MX", "Hola"),
            )
            .unwrap_or_else(|e| panic!("fixture dictionary must insert: {e}"));
        Arc::new(dictionary)
    }
}

// ============================================================================
// COUNTING COLLABORATORS
// ============================================================================

/// Content store wrapper counting `get_by_id` calls.
#[derive(Debug)]
pub struct CountingContentStore<S> {
    inner: Arc<S>,
    calls: AtomicU64,
    failing: AtomicBool,
}

impl<S: ContentStore> CountingContentStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of `get_by_id` calls so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: ContentStore> ContentStore for CountingContentStore<S> {
    async fn get_by_id(&self, id: NodeId) -> LinguaResult<Option<ContentNode>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "store switched off by test".to_string(),
            }
            .into());
        }
        self.inner.get_by_id(id).await
    }
}

/// Dictionary wrapper counting `get_term_by_key` calls.
#[derive(Debug)]
pub struct CountingDictionary<D> {
    inner: Arc<D>,
    calls: AtomicU64,
    failing: AtomicBool,
}

impl<D: DictionaryService> CountingDictionary<D> {
    pub fn new(inner: Arc<D>) -> Self {
        Self {
            inner,
            calls: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with `DictionaryError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl<D: DictionaryService> DictionaryService for CountingDictionary<D> {
    async fn get_term_by_key(&self, key: &str) -> LinguaResult<Option<DictionaryItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DictionaryError::Unavailable {
                reason: "dictionary switched off by test".to_string(),
            }
            .into());
        }
        self.inner.get_term_by_key(key).await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for lingua types.

    use super::*;
    use proptest::prelude::*;

    /// Locale codes in mixed case, blank values included.
    pub fn arb_locale() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("en-us"),
            Just("EN-US"),
            Just("es-mx"),
            Just("Es-Mx"),
            Just("fr-fr"),
            Just("de-de"),
            Just(""),
            Just("  "),
        ]
        .prop_map(str::to_string)
    }

    /// Locale codes that are never blank.
    pub fn arb_present_locale() -> impl Strategy<Value = String> {
        arb_locale().prop_filter("locale must not be blank", |l| !l.trim().is_empty())
    }

    pub fn arb_node_id() -> impl Strategy<Value = NodeId> {
        (1i64..1_000_000).prop_map(NodeId::new)
    }

    /// Locale field values of a translation folder's children; `None` leaves
    /// the field off the child.
    pub fn arb_folder_locales() -> impl Strategy<Value = Vec<Option<String>>> {
        prop::collection::vec(prop::option::of(arb_locale()), 0..8)
    }

    /// Build a `homePage` (id 1) whose folder (id 10) has one child per
    /// entry, ids 11 and up.
    pub fn page_from_locales(locales: &[Option<String>]) -> ContentNode {
        let folder = locales.iter().enumerate().fold(
            ContentNode::new(10, "homePageTranslationFolder"),
            |folder, (i, locale)| {
                let child = ContentNode::new(11 + i as i64, "translation");
                folder.with_child(match locale {
                    Some(locale) => child.with_field("language", locale.as_str()),
                    None => child,
                })
            },
        );
        ContentNode::new(1, "homePage").with_child(folder)
    }
}

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-friendly tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lingua=debug,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TESTS
// ============================================================================
