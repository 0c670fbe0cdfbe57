//! Cache-aside reads.
//!
//! The resolver checks the cache first and answers from it when the payload
//! decodes. Otherwise it queries the store, maps every record, writes the
//! result set back under the same key and returns it. The cache is never
//! allowed to fail a read: a cache error or a corrupt payload counts as a
//! miss, and a failed repopulate is logged and ignored.

use std::sync::Arc;
use std::time::Duration;

use paddock_core::{
    Metadata, PaddockResult, RoundsData, RoundsFilter, RoundsResponse, SeasonsData, SeasonsFilter,
    SeasonsResponse,
};
use tracing::{debug, warn};

use super::key::CacheKey;
use crate::document::Filter;
use crate::mapper::{
    decode_payload, encode_payload, rounds_query, seasons_query, CachedResultSet, DocumentRecord,
    StoredEntity,
};
use crate::traits::{CacheBackend, DocumentStore};

/// Configuration for the cache-aside resolver.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiry applied to every repopulated entry.
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// Cache-aside resolver over injected store and cache handles.
///
/// # Type Parameters
///
/// - `S`: The durable document store queried on miss
/// - `C`: The cache backend holding serialized result sets
pub struct CacheAsideResolver<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    store: Arc<S>,
    cache: Arc<C>,
    config: CacheConfig,
}

impl<S, C> CacheAsideResolver<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: CacheConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Create a resolver with default configuration.
    pub fn with_defaults(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(store, cache, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve a seasons query. No match is an empty list.
    pub async fn seasons(&self, filter: &SeasonsFilter) -> PaddockResult<SeasonsResponse> {
        let key = CacheKey::for_seasons(filter);
        let (data, cached) = self
            .resolve::<SeasonsData>(key, seasons_query(filter))
            .await?;
        Ok(SeasonsResponse {
            metadata: Metadata::now(cached),
            seasons: data.seasons,
        })
    }

    /// Resolve a rounds query. No match is an empty list.
    pub async fn rounds(&self, filter: &RoundsFilter) -> PaddockResult<RoundsResponse> {
        let key = CacheKey::for_rounds(filter);
        let (data, cached) = self.resolve::<RoundsData>(key, rounds_query(filter)).await?;
        Ok(RoundsResponse {
            metadata: Metadata::now(cached),
            rounds: data.rounds,
        })
    }

    async fn resolve<P>(&self, key: CacheKey, query: Filter) -> PaddockResult<(P, bool)>
    where
        P: CachedResultSet,
    {
        let key_text = key.to_string();

        match self.cache.get(&key_text).await {
            Ok(Some(bytes)) => match decode_payload::<P>(&bytes) {
                Ok(data) => {
                    debug!(key = %key_text, "cache hit");
                    return Ok((data, true));
                }
                Err(e) => warn!(key = %key_text, error = %e, "corrupt cache payload, reading through"),
            },
            Ok(None) => debug!(key = %key_text, "cache miss"),
            Err(e) => warn!(key = %key_text, error = %e, "cache read failed, reading through"),
        }

        let collection = <P::Item as StoredEntity>::COLLECTION;
        let docs = self.store.find(collection, &query).await?;
        let items: Vec<P::Item> = docs
            .iter()
            .map(<P::Item as DocumentRecord>::from_document)
            .collect();
        let data = P::from_items(items);

        match encode_payload(&data) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(&key_text, bytes, self.config.entry_ttl).await {
                    warn!(key = %key_text, error = %e, "cache populate failed");
                }
            }
            Err(e) => warn!(key = %key_text, error = %e, "cache payload encode failed"),
        }

        Ok((data, false))
    }
}

impl<S, C> Clone for CacheAsideResolver<S, C>
where
    S: DocumentStore,
    C: CacheBackend,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCacheBackend;
    use crate::memory_store::InMemoryDocumentStore;
    use crate::traits::CacheBackend;
    use paddock_core::{PaddockError, SeasonStatus, StorageError};
    use paddock_test_utils::fixtures::{bahrain_round, round_fixture, season_fixture};

    fn setup() -> (
        CacheAsideResolver<InMemoryDocumentStore, InMemoryCacheBackend>,
        Arc<InMemoryDocumentStore>,
        Arc<InMemoryCacheBackend>,
    ) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let cache = Arc::new(InMemoryCacheBackend::new());
        let resolver = CacheAsideResolver::with_defaults(Arc::clone(&store), Arc::clone(&cache));
        (resolver, store, cache)
    }

    fn plant_round(store: &InMemoryDocumentStore, round: &paddock_core::Round) {
        store
            .insert_raw("rounds", round.key_filter(), round.to_document())
            .unwrap();
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (resolver, store, _cache) = setup();
        plant_round(&store, &bahrain_round());

        let first = resolver.rounds(&RoundsFilter::season(2024)).await.unwrap();
        assert!(!first.metadata.cached);
        assert_eq!(first.rounds, vec![bahrain_round()]);

        let second = resolver.rounds(&RoundsFilter::season(2024)).await.unwrap();
        assert!(second.metadata.cached);
        assert_eq!(second.rounds, first.rounds);
        assert_eq!(store.find_calls(), 1, "a hit must not touch the store");
    }

    #[tokio::test]
    async fn test_empty_result_is_cached_too() {
        let (resolver, store, cache) = setup();

        let response = resolver.seasons(&SeasonsFilter::year(2023)).await.unwrap();
        assert!(response.seasons.is_empty());
        assert!(!response.metadata.cached);
        assert!(cache.get("seasons:2023").await.unwrap().is_some());

        let again = resolver.seasons(&SeasonsFilter::year(2023)).await.unwrap();
        assert!(again.metadata.cached);
        assert_eq!(store.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_payload_reads_through_and_repairs() {
        let (resolver, store, cache) = setup();
        plant_round(&store, &bahrain_round());
        cache
            .set("rounds:2024", b"{broken".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let response = resolver.rounds(&RoundsFilter::season(2024)).await.unwrap();
        assert!(!response.metadata.cached);
        assert_eq!(response.rounds.len(), 1);

        let bytes = cache.get("rounds:2024").await.unwrap().unwrap();
        let repaired: RoundsData = decode_payload(&bytes).unwrap();
        assert_eq!(repaired.rounds, response.rounds);
    }

    #[tokio::test]
    async fn test_unreachable_cache_degrades_to_store() {
        let (resolver, store, cache) = setup();
        plant_round(&store, &bahrain_round());
        cache.set_unavailable(true);

        for _ in 0..2 {
            let response = resolver.rounds(&RoundsFilter::season(2024)).await.unwrap();
            assert!(!response.metadata.cached);
            assert_eq!(response.rounds.len(), 1);
        }
        assert_eq!(store.find_calls(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (resolver, store, _cache) = setup();
        store.fail_next_find();

        let err = resolver.seasons(&SeasonsFilter::all()).await.unwrap_err();
        assert!(matches!(
            err,
            PaddockError::Storage(StorageError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_rounds_keep_store_order() {
        let (resolver, store, _cache) = setup();
        for id in [3, 1, 2] {
            plant_round(&store, &round_fixture(2024, id, &format!("Round {}", id)));
        }

        let response = resolver.rounds(&RoundsFilter::season(2024)).await.unwrap();
        let ids: Vec<i32> = response.rounds.iter().map(|r| r.round_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_status_filter_shares_year_slot() {
        let (resolver, store, _cache) = setup();
        let season = season_fixture(2022);
        store
            .insert_raw("seasons", season.key_filter(), season.to_document())
            .unwrap();

        let active = resolver
            .seasons(&SeasonsFilter::year(2022).with_status(SeasonStatus::Active))
            .await
            .unwrap();
        assert!(active.seasons.is_empty());

        // Same key, so the unfiltered read is served the filtered snapshot.
        let unfiltered = resolver.seasons(&SeasonsFilter::year(2022)).await.unwrap();
        assert!(unfiltered.metadata.cached);
        assert!(unfiltered.seasons.is_empty());
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new().with_ttl(Duration::from_secs(1800));
        assert_eq!(config.entry_ttl, Duration::from_secs(1800));
        assert_eq!(CacheConfig::default().entry_ttl, Duration::from_secs(3600));
    }
}
