//! Error types for paddock operations

use crate::EntityType;
use thiserror::Error;

/// Durable store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with key {key}")]
    NotFound { entity_type: EntityType, key: String },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Query failed on {collection}: {reason}")]
    QueryFailed { collection: String, reason: String },

    #[error("Write failed on {collection}: {reason}")]
    WriteFailed { collection: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cache payload codec error: {reason}")]
    Codec { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Standings for season {year} are not contiguous: expected position {expected}, got {got}")]
    NonContiguousStandings { year: i32, expected: i32, got: i32 },
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
}

/// Master error type for all paddock errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaddockError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl PaddockError {
    /// True when the error is a lookup that matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PaddockError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for paddock operations.
pub type PaddockResult<T> = Result<T, PaddockError>;

// =============================================================================
// TESTS
// =============================================================================
