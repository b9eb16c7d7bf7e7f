//! Cached dictionary term lookups.

use std::sync::Arc;
use std::time::Duration;

use lingua_core::{is_blank, DictionaryKeying, LinguaResult, TranslationConfig};
use lingua_storage::{
    AdapterStats, CacheBackend, CacheKey, CacheScopeProvider, DictionaryService, KeySpace,
    KeyedCache, LocaleSource,
};

/// Tag carried by every dictionary entry computed for `locale`.
pub fn locale_tag(locale: &str) -> String {
    format!("locale:{}", locale)
}

/// Cache key of a dictionary lookup.
///
/// Under [`DictionaryKeying::TermOnly`] the locale is left out, so every
/// locale of a term shares one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionaryKey {
    term: String,
    locale: Option<String>,
}

impl DictionaryKey {
    pub fn new(term: &str, locale: &str, keying: DictionaryKeying) -> Self {
        Self {
            term: term.to_string(),
            locale: match keying {
                DictionaryKeying::TermAndLocale => Some(locale.to_string()),
                DictionaryKeying::TermOnly => None,
            },
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}

impl CacheKey for DictionaryKey {
    fn encode(&self) -> String {
        // Terms are free text, so encode as a JSON array to stay injective.
        serde_json::json!([self.term, self.locale]).to_string()
    }
}

/// Term + locale -> translated string, cached over a dictionary service.
pub struct DictionaryTermCache<D: DictionaryService, B: CacheBackend> {
    service: Arc<D>,
    cache: Arc<KeyedCache<DictionaryKey, Option<String>, B>>,
    scope: Arc<dyn CacheScopeProvider>,
    keying: DictionaryKeying,
    ttl: Duration,
}

impl<D: DictionaryService, B: CacheBackend> Clone for DictionaryTermCache<D, B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
            scope: Arc::clone(&self.scope),
            keying: self.keying,
            ttl: self.ttl,
        }
    }
}

impl<D: DictionaryService, B: CacheBackend> DictionaryTermCache<D, B> {
    pub fn new(
        service: Arc<D>,
        backend: Arc<B>,
        scope: Arc<dyn CacheScopeProvider>,
        config: &TranslationConfig,
    ) -> LinguaResult<Self> {
        config.validate()?;
        Ok(Self {
            service,
            cache: Arc::new(
                KeyedCache::new(backend, KeySpace::DictionaryTerm)
                    .with_single_flight(config.single_flight),
            ),
            scope,
            keying: config.dictionary_keying,
            ttl: config.dictionary_ttl,
        })
    }

    /// A term cache over the same backend entries under another scope
    /// provider. Entries are never shared across scopes.
    pub fn scoped(&self, scope: Arc<dyn CacheScopeProvider>) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    pub fn keying(&self) -> DictionaryKeying {
        self.keying
    }

    /// Translation of `term` into `locale`.
    ///
    /// Picks the first translation whose language code matches `locale`
    /// ignoring case. Returns `Ok(None)` for a blank term or locale without
    /// consulting the service, and when the term or that locale's value
    /// does not exist.
    pub async fn get_translation(&self, term: &str, locale: &str) -> LinguaResult<Option<String>> {
        if is_blank(term) || is_blank(locale) {
            return Ok(None);
        }

        let scope_tags = self.scope.current_tags();

        let service = self.service.as_ref();
        let read = self
            .cache
            .get_or_compute_scoped(
                &DictionaryKey::new(term, locale, self.keying),
                &scope_tags,
                || async move {
                    let item = service.get_term_by_key(term).await?;
                    Ok(item.and_then(|item| {
                        item.translation_for(locale)
                            .map(|translation| translation.value.clone())
                    }))
                },
                self.ttl,
                &[locale_tag(locale)],
            )
            .await?;

        tracing::trace!(
            term,
            locale,
            found = read.value().is_some(),
            cached = read.was_cache_hit(),
            "Dictionary lookup"
        );
        Ok(read.into_value())
    }

    /// [`get_translation`](Self::get_translation) for the locale supplied by
    /// `locales`. `Ok(None)` when no locale is available.
    pub async fn get_translation_for_current_locale(
        &self,
        term: &str,
        locales: &dyn LocaleSource,
    ) -> LinguaResult<Option<String>> {
        match locales.current_locale() {
            Some(locale) => self.get_translation(term, &locale).await,
            None => Ok(None),
        }
    }

    pub fn stats(&self) -> AdapterStats {
        self.cache.stats()
    }
}
