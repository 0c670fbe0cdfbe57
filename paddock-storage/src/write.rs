//! Write/invalidate coordinator.
//!
//! Persists a batch as one bulk upsert keyed by natural identity, then drops
//! every cache key the batch can have changed. Invalidation runs after any
//! attempted store write, failed ones included, since a failed bulk write
//! may still have applied part of the batch. Nothing is rolled back:
//! re-running the whole batch is safe because upserts are idempotent.

use std::sync::Arc;

use paddock_core::{Round, Season, WriteOutcome};
use tracing::{error, info, warn};

use crate::cache::CacheKey;
use crate::document::Upsert;
use crate::mapper::{DocumentRecord, StoredEntity};
use crate::traits::{CacheBackend, DocumentStore};

/// Coordinates durable writes with cache invalidation.
pub struct WriteCoordinator<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    store: Arc<S>,
    cache: Arc<C>,
}

impl<S, C> WriteCoordinator<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self { store, cache }
    }

    /// Upsert seasons by year and drop `seasons:all`.
    ///
    /// A season whose standings fail validation rejects the whole batch
    /// before the store is touched.
    pub async fn write_seasons(&self, seasons: &[Season]) -> WriteOutcome {
        if let Err(e) = seasons.iter().try_for_each(Season::validate) {
            warn!(error = %e, "rejected season batch");
            return WriteOutcome::failed(e.to_string());
        }
        self.write_batch(seasons, &CacheKey::for_season_write()).await
    }

    /// Upsert rounds by `(season, round_id)` and drop both round keys for
    /// every round in the batch.
    pub async fn write_rounds(&self, rounds: &[Round]) -> WriteOutcome {
        self.write_batch(rounds, &CacheKey::for_round_write(rounds))
            .await
    }

    /// Upsert then invalidate. A caller that drops this future between the
    /// two steps leaves stale keys until TTL, so the RPC layer runs writes
    /// on a detached task and only its wait is bounded.
    async fn write_batch<T: StoredEntity>(&self, items: &[T], keys: &[CacheKey]) -> WriteOutcome {
        if items.is_empty() {
            return WriteOutcome::succeeded(format!("No {} to write", T::COLLECTION), 0);
        }

        let batch: Vec<Upsert> = items
            .iter()
            .map(|item| Upsert::new(item.key_filter(), item.to_document()))
            .collect();

        let result = self.store.bulk_upsert(T::COLLECTION, batch).await;
        self.invalidate(keys).await;

        match result {
            Ok(affected) => {
                info!(collection = T::COLLECTION, affected, "bulk upsert applied");
                WriteOutcome::succeeded(
                    format!("Upserted {} {} records", affected, T::COLLECTION),
                    affected,
                )
            }
            Err(e) => {
                error!(collection = T::COLLECTION, error = %e, "bulk upsert failed");
                WriteOutcome::failed(e.to_string())
            }
        }
    }

    /// Fire-and-forget: a failed delete is logged and left to TTL.
    async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            let key_text = key.to_string();
            match self.cache.delete(&key_text).await {
                Ok(removed) => info!(key = %key_text, removed, "cache key invalidated"),
                Err(e) => warn!(key = %key_text, error = %e, "cache invalidation failed"),
            }
        }
    }
}

impl<S, C> Clone for WriteCoordinator<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
        }
    }
}
