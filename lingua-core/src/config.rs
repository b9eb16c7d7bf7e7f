//! Resolver configuration
//!
//! Every value has a default matching the conventions of the host content
//! tree (a `<typeAlias>TranslationFolder` child, a `language` field, one hour
//! cache lifetimes). Defaults can be overridden from TOML or from `LINGUA_*`
//! environment variables, and `validate()` rejects unusable values.

use crate::error::{ConfigError, LinguaError, LinguaResult};
use crate::locale::is_blank;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Suffix appended to a page's type alias to name its translation folder type.
pub const DEFAULT_FOLDER_SUFFIX: &str = "TranslationFolder";

/// Field on a translation node holding its locale code.
pub const DEFAULT_LOCALE_FIELD: &str = "language";

/// Lifetime of every cache entry unless configured otherwise (1 hour).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// How dictionary translations are keyed in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryKeying {
    /// Key by term and locale: each locale gets its own entry.
    #[default]
    TermAndLocale,
    /// Key by term alone; the locale only travels in the invalidation tags.
    /// A term read in one locale is served to every other locale until the
    /// entry expires or one of its tags is invalidated.
    TermOnly,
}

impl DictionaryKeying {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "term_and_locale" => Some(Self::TermAndLocale),
            "term_only" => Some(Self::TermOnly),
            _ => None,
        }
    }
}

/// Configuration for translation resolution and its caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TranslationConfig {
    /// Appended to the page type alias to find the translation folder.
    pub folder_suffix: String,
    /// Field naming the locale of a translation node.
    pub locale_field: String,
    /// TTL of (page, locale) -> translation node entries.
    #[serde(with = "duration_secs")]
    pub node_ttl: Duration,
    /// TTL of page -> translation folder entries.
    #[serde(with = "duration_secs")]
    pub folder_ttl: Duration,
    /// TTL of page -> translated locales entries.
    #[serde(with = "duration_secs")]
    pub locales_ttl: Duration,
    /// TTL of dictionary term entries.
    #[serde(with = "duration_secs")]
    pub dictionary_ttl: Duration,
    /// Collapse concurrent misses for the same key into one computation.
    pub single_flight: bool,
    /// Dictionary cache keying strategy.
    pub dictionary_keying: DictionaryKeying,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let ttl = Duration::from_secs(DEFAULT_CACHE_TTL_SECS);
        Self {
            folder_suffix: DEFAULT_FOLDER_SUFFIX.to_string(),
            locale_field: DEFAULT_LOCALE_FIELD.to_string(),
            node_ttl: ttl,
            folder_ttl: ttl,
            locales_ttl: ttl,
            dictionary_ttl: ttl,
            single_flight: true,
            dictionary_keying: DictionaryKeying::default(),
        }
    }
}

impl TranslationConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the translation folder type suffix.
    pub fn with_folder_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.folder_suffix = suffix.into();
        self
    }

    /// Set the locale field name.
    pub fn with_locale_field(mut self, field: impl Into<String>) -> Self {
        self.locale_field = field.into();
        self
    }

    /// Set the same TTL on every cache.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.node_ttl = ttl;
        self.folder_ttl = ttl;
        self.locales_ttl = ttl;
        self.dictionary_ttl = ttl;
        self
    }

    /// Set the translation node TTL.
    pub fn with_node_ttl(mut self, ttl: Duration) -> Self {
        self.node_ttl = ttl;
        self
    }

    /// Set the translation folder TTL.
    pub fn with_folder_ttl(mut self, ttl: Duration) -> Self {
        self.folder_ttl = ttl;
        self
    }

    /// Set the translated locales TTL.
    pub fn with_locales_ttl(mut self, ttl: Duration) -> Self {
        self.locales_ttl = ttl;
        self
    }

    /// Set the dictionary TTL.
    pub fn with_dictionary_ttl(mut self, ttl: Duration) -> Self {
        self.dictionary_ttl = ttl;
        self
    }

    /// Enable or disable single-flight computation.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Set the dictionary keying strategy.
    pub fn with_dictionary_keying(mut self, keying: DictionaryKeying) -> Self {
        self.dictionary_keying = keying;
        self
    }

    /// Parse a TOML document and validate it. Missing keys take defaults.
    pub fn from_toml_str(contents: &str) -> LinguaResult<Self> {
        let config: TranslationConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    /// - `LINGUA_FOLDER_SUFFIX`: translation folder type suffix (default: `TranslationFolder`)
    /// - `LINGUA_LOCALE_FIELD`: locale field name (default: `language`)
    /// - `LINGUA_NODE_TTL_SECS`: translation node TTL (default: 3600)
    /// - `LINGUA_FOLDER_TTL_SECS`: translation folder TTL (default: 3600)
    /// - `LINGUA_LOCALES_TTL_SECS`: translated locales TTL (default: 3600)
    /// - `LINGUA_DICTIONARY_TTL_SECS`: dictionary TTL (default: 3600)
    /// - `LINGUA_SINGLE_FLIGHT`: `false` disables single-flight (default: true)
    /// - `LINGUA_DICTIONARY_KEYING`: `term_and_locale` or `term_only`
    ///
    /// Unparseable values are ignored and leave the default in place.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |name: &str| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        if let Some(suffix) = lookup("LINGUA_FOLDER_SUFFIX") {
            self.folder_suffix = suffix;
        }
        if let Some(field) = lookup("LINGUA_LOCALE_FIELD") {
            self.locale_field = field;
        }
        if let Some(ttl) = secs("LINGUA_NODE_TTL_SECS") {
            self.node_ttl = ttl;
        }
        if let Some(ttl) = secs("LINGUA_FOLDER_TTL_SECS") {
            self.folder_ttl = ttl;
        }
        if let Some(ttl) = secs("LINGUA_LOCALES_TTL_SECS") {
            self.locales_ttl = ttl;
        }
        if let Some(ttl) = secs("LINGUA_DICTIONARY_TTL_SECS") {
            self.dictionary_ttl = ttl;
        }
        if let Some(flag) = lookup("LINGUA_SINGLE_FLIGHT") {
            self.single_flight = flag.trim().to_lowercase() != "false";
        }
        if let Some(keying) = lookup("LINGUA_DICTIONARY_KEYING").and_then(|s| DictionaryKeying::parse(&s)) {
            self.dictionary_keying = keying;
        }
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - folder_suffix and locale_field are not blank
    /// - every TTL is positive
    pub fn validate(&self) -> LinguaResult<()> {
        if is_blank(&self.folder_suffix) {
            return Err(invalid("folder_suffix", &self.folder_suffix, "must not be blank"));
        }
        if is_blank(&self.locale_field) {
            return Err(invalid("locale_field", &self.locale_field, "must not be blank"));
        }

        let ttls = [
            ("node_ttl", self.node_ttl),
            ("folder_ttl", self.folder_ttl),
            ("locales_ttl", self.locales_ttl),
            ("dictionary_ttl", self.dictionary_ttl),
        ];
        for (field, ttl) in ttls {
            if ttl.is_zero() {
                return Err(invalid(field, &format!("{:?}", ttl), "must be positive"));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> LinguaError {
    LinguaError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
