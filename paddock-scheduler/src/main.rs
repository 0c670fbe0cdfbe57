//! PADDOCK Scheduler Entry Point
//!
//! Chooses the durable store and the cache from configuration, then serves
//! the RPC router until SIGINT or SIGTERM, draining in-flight calls. PostgreSQL is used when
//! `PADDOCK_DB_HOST` is set, LMDB when `PADDOCK_CACHE_PATH` is set; either
//! falls back to its in-process implementation.

use std::sync::Arc;

use paddock_scheduler::server;
use paddock_scheduler::telemetry::init_tracing;
use paddock_scheduler::{
    create_router, ApiError, ApiResult, DbConfig, PgDocumentStore, ScheduleService,
    SchedulerConfig,
};
use paddock_storage::{
    CacheBackend, DocumentStore, InMemoryCacheBackend, InMemoryDocumentStore, LmdbCacheBackend,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing()?;

    let config = SchedulerConfig::from_env();

    if DbConfig::configured() {
        let db_config = DbConfig::from_env();
        let store = PgDocumentStore::from_config(&db_config)?;
        store.ensure_schema().await?;
        tracing::info!(host = %db_config.host, dbname = %db_config.dbname, "Using PostgreSQL document store");
        with_cache(Arc::new(store), &config).await
    } else {
        tracing::warn!("PADDOCK_DB_HOST not set, using in-memory document store");
        with_cache(Arc::new(InMemoryDocumentStore::new()), &config).await
    }
}

async fn with_cache<S>(store: Arc<S>, config: &SchedulerConfig) -> ApiResult<()>
where
    S: DocumentStore + 'static,
{
    match &config.cache_path {
        Some(path) => {
            let cache = LmdbCacheBackend::new(path, config.cache_max_mb).map_err(|e| {
                ApiError::internal_error(format!("Failed to open cache at {}: {}", path.display(), e))
            })?;
            tracing::info!(path = %path.display(), max_mb = config.cache_max_mb, "Using LMDB cache");
            serve(store, Arc::new(cache), config).await
        }
        None => {
            tracing::info!("Using in-memory cache");
            serve(store, Arc::new(InMemoryCacheBackend::new()), config).await
        }
    }
}

async fn serve<S, C>(store: Arc<S>, cache: Arc<C>, config: &SchedulerConfig) -> ApiResult<()>
where
    S: DocumentStore + 'static,
    C: CacheBackend + 'static,
{
    let service = Arc::new(ScheduleService::new(store, cache, config.cache_config()));
    let app = create_router(service, config.call_timeout);

    let addr = server::listen_addr(config)?;
    tracing::info!(%addr, "Starting PADDOCK scheduler");

    let listener = server::bind(addr).await?;
    server::serve_until(listener, app, server::shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
