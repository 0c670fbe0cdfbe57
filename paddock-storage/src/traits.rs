//! Capability traits for the durable store and the cache.
//!
//! The resolver and the write coordinator only ever see these traits.
//! Concrete handles are injected at construction.

use std::time::Duration;

use async_trait::async_trait;
use paddock_core::PaddockResult;

use crate::document::{Document, Filter, Upsert};

/// Durable document store.
///
/// Implementations must be safe to share across concurrent calls. There is
/// no cross-call locking; the store's own per-document ordering is the only
/// ordering guarantee.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find every document in `collection` matching `filter`, in store
    /// iteration order. No match is an empty list, not an error.
    async fn find(&self, collection: &str, filter: &Filter) -> PaddockResult<Vec<Document>>;

    /// Insert-or-replace each document keyed by its filter.
    ///
    /// Returns the number of records matched or inserted, so re-applying
    /// the same batch reports the same count.
    async fn bulk_upsert(&self, collection: &str, batch: Vec<Upsert>) -> PaddockResult<u64>;

    /// Readiness check.
    async fn ping(&self) -> PaddockResult<()>;
}

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the payload stored at `key`. Expired entries are misses.
    async fn get(&self, key: &str) -> PaddockResult<Option<Vec<u8>>>;

    /// Store `value` at `key`, replacing any previous payload.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PaddockResult<()>;

    /// Remove `key`. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> PaddockResult<bool>;

    async fn stats(&self) -> PaddockResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, expired entries included.
    pub misses: u64,
    /// Number of entries currently stored.
    pub entry_count: u64,
    /// Number of entries dropped because they expired.
    pub expirations: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
