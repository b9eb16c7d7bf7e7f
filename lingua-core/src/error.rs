//! Error types for lingua operations
//!
//! Absence (no folder, no translation node, no dictionary term) is never an
//! error: it is an empty result. These types only describe failures of the
//! collaborators the resolver depends on, plus invalid configuration.

use thiserror::Error;

/// Content store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Content store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Insert failed for node {id}: {reason}")]
    InsertFailed { id: i64, reason: String },

    #[error("Update failed for node {id}: {reason}")]
    UpdateFailed { id: i64, reason: String },

    #[error("Content store lock poisoned")]
    LockPoisoned,
}

/// Cache layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failure: {reason}")]
    Backend { reason: String },

    #[error("Cached value in {space} could not be (de)serialized: {reason}")]
    Serialization { space: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Dictionary service errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("Dictionary service unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for all lingua errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinguaError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for lingua operations.
pub type LinguaResult<T> = Result<T, LinguaError>;

// =============================================================================
// TESTS
// =============================================================================
