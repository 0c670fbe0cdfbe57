//! Schedule service facade.
//!
//! Owns the resolver and the write coordinator, both built over the same
//! injected store and cache handles, and exposes the schedule operations
//! to the RPC boundary.

use std::sync::Arc;

use paddock_core::{
    EntityType, PaddockResult, Round, RoundsFilter, RoundsResponse, Season, SeasonsFilter,
    SeasonsResponse, StorageError, WriteOutcome,
};
use paddock_storage::{
    CacheAsideResolver, CacheBackend, CacheConfig, CacheStats, DocumentStore, WriteCoordinator,
};
use serde::Serialize;
use tracing::{instrument, warn};

/// Readiness report returned by [`ScheduleService::health`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    /// Whether the durable store answered a ping.
    pub store_ok: bool,
    /// Error text from a failed ping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    /// Cache statistics, absent when the cache could not report them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

pub struct ScheduleService<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    store: Arc<S>,
    cache: Arc<C>,
    resolver: CacheAsideResolver<S, C>,
    writer: WriteCoordinator<S, C>,
}

impl<S, C> ScheduleService<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: CacheConfig) -> Self {
        let resolver = CacheAsideResolver::new(Arc::clone(&store), Arc::clone(&cache), config);
        let writer = WriteCoordinator::new(Arc::clone(&store), Arc::clone(&cache));
        Self {
            store,
            cache,
            resolver,
            writer,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_seasons(&self, filter: SeasonsFilter) -> PaddockResult<SeasonsResponse> {
        self.resolver.seasons(&filter).await
    }

    #[instrument(skip(self))]
    pub async fn get_rounds(&self, filter: RoundsFilter) -> PaddockResult<RoundsResponse> {
        self.resolver.rounds(&filter).await
    }

    /// Single-round lookup. Unlike the list queries, no match is an error.
    #[instrument(skip(self))]
    pub async fn get_round(&self, season: i32, round_id: i32) -> PaddockResult<Round> {
        let response = self
            .resolver
            .rounds(&RoundsFilter::round(season, round_id))
            .await?;

        response.rounds.into_iter().next().ok_or_else(|| {
            StorageError::NotFound {
                entity_type: EntityType::Round,
                key: format!("{}:{}", season, round_id),
            }
            .into()
        })
    }

    #[instrument(skip(self, seasons), fields(count = seasons.len()))]
    pub async fn write_seasons(&self, seasons: Vec<Season>) -> WriteOutcome {
        self.writer.write_seasons(&seasons).await
    }

    #[instrument(skip(self, rounds), fields(count = rounds.len()))]
    pub async fn write_rounds(&self, rounds: Vec<Round>) -> WriteOutcome {
        self.writer.write_rounds(&rounds).await
    }

    pub async fn health(&self) -> ServiceHealth {
        let (store_ok, store_error) = match self.store.ping().await {
            Ok(()) => (true, None),
            Err(e) => {
                warn!(error = %e, "store ping failed");
                (false, Some(e.to_string()))
            }
        };

        let cache = match self.cache.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "cache stats unavailable");
                None
            }
        };

        ServiceHealth {
            store_ok,
            store_error,
            cache,
        }
    }
}
