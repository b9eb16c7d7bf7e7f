//! Lingua Core - Data Types
//!
//! Pure data structures shared by every lingua crate: node identity, the
//! content node snapshot, locale comparison rules, the error taxonomy, and
//! resolver configuration. No I/O and no async live here.

pub mod config;
pub mod error;
pub mod identity;
pub mod locale;
pub mod node;

pub use config::{
    DictionaryKeying, TranslationConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_FOLDER_SUFFIX,
    DEFAULT_LOCALE_FIELD,
};
pub use error::{
    CacheError, ConfigError, DictionaryError, LinguaError, LinguaResult, StoreError,
};
pub use identity::NodeId;
pub use locale::{invariant_eq, is_blank, non_blank};
pub use node::ContentNode;
