//! Dictionary service contract and in-memory implementation.

use async_trait::async_trait;
use lingua_core::{invariant_eq, LinguaResult, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// One translated value of a dictionary term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryTranslation {
    pub language_code: String,
    pub value: String,
}

impl DictionaryTranslation {
    pub fn new(language_code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            value: value.into(),
        }
    }
}

/// A dictionary term with its translations, in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryItem {
    pub key: String,
    #[serde(default)]
    pub translations: Vec<DictionaryTranslation>,
}

impl DictionaryItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            translations: Vec::new(),
        }
    }

    /// Builder: append a translation.
    pub fn with_translation(
        mut self,
        language_code: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.translations
            .push(DictionaryTranslation::new(language_code, value));
        self
    }

    /// First translation whose language code matches, ignoring case.
    pub fn translation_for(&self, locale: &str) -> Option<&DictionaryTranslation> {
        self.translations
            .iter()
            .find(|t| invariant_eq(&t.language_code, locale))
    }
}

/// Term lookup service.
#[async_trait]
pub trait DictionaryService: Send + Sync {
    /// Fetch a term by its exact key. `Ok(None)` when the term does not exist.
    async fn get_term_by_key(&self, key: &str) -> LinguaResult<Option<DictionaryItem>>;
}

/// In-memory dictionary keyed by exact term.
#[derive(Debug, Default)]
pub struct InMemoryDictionary {
    items: RwLock<HashMap<String, DictionaryItem>>,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a term.
    pub fn insert(&self, item: DictionaryItem) -> LinguaResult<()> {
        let mut items = self.items.write().map_err(|_| StoreError::LockPoisoned)?;
        items.insert(item.key.clone(), item);
        Ok(())
    }

    /// Set one locale's value on a term, creating the term if needed.
    ///
    /// An existing translation with a case-insensitively equal language code
    /// is replaced in place.
    pub fn set_translation(
        &self,
        key: &str,
        language_code: &str,
        value: impl Into<String>,
    ) -> LinguaResult<()> {
        let mut items = self.items.write().map_err(|_| StoreError::LockPoisoned)?;
        let item = items
            .entry(key.to_string())
            .or_insert_with(|| DictionaryItem::new(key));
        let value = value.into();
        match item
            .translations
            .iter_mut()
            .find(|t| invariant_eq(&t.language_code, language_code))
        {
            Some(existing) => existing.value = value,
            None => item
                .translations
                .push(DictionaryTranslation::new(language_code, value)),
        }
        Ok(())
    }

    /// Remove a term. Returns whether it existed.
    pub fn remove(&self, key: &str) -> LinguaResult<bool> {
        let mut items = self.items.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(items.remove(key).is_some())
    }
}

#[async_trait]
impl DictionaryService for InMemoryDictionary {
    async fn get_term_by_key(&self, key: &str) -> LinguaResult<Option<DictionaryItem>> {
        let items = self.items.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }
}
