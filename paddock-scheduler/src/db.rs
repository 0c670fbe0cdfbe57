//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! [`PgDocumentStore`] that backs the durable side of the cache-aside layer.
//!
//! Every collection lives in one table. A row is keyed by
//! `(collection, natural_key)` where the natural key is rendered from the
//! upsert filter, so re-applying a batch replaces rows instead of adding
//! them. `seq` records first insertion and gives `find` a stable order.

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use paddock_core::{PaddockResult, StorageError};
use paddock_storage::document::natural_key;
use paddock_storage::{Document, DocumentStore, Filter, Upsert};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::{debug, instrument};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create/recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "paddock".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// True when the environment names a database host at all.
    pub fn configured() -> bool {
        std::env::var("PADDOCK_DB_HOST").is_ok()
    }

    /// Build a configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("PADDOCK_DB_HOST").unwrap_or(defaults.host),
            port: lookup("PADDOCK_DB_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: lookup("PADDOCK_DB_NAME").unwrap_or(defaults.dbname),
            user: lookup("PADDOCK_DB_USER").unwrap_or(defaults.user),
            password: lookup("PADDOCK_DB_PASSWORD").unwrap_or_default(),
            max_size: lookup("PADDOCK_DB_POOL_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: lookup("PADDOCK_DB_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        pool_cfg.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS paddock_documents (
    collection  TEXT   NOT NULL,
    natural_key TEXT   NOT NULL,
    doc         JSONB  NOT NULL,
    seq         BIGSERIAL,
    PRIMARY KEY (collection, natural_key)
);
CREATE INDEX IF NOT EXISTS paddock_documents_doc_idx
    ON paddock_documents USING GIN (doc jsonb_path_ops);
";

const FIND_SQL: &str = "SELECT doc FROM paddock_documents \
     WHERE collection = $1 AND doc @> $2 \
     ORDER BY seq";

const UPSERT_SQL: &str = "INSERT INTO paddock_documents (collection, natural_key, doc) \
     VALUES ($1, $2, $3) \
     ON CONFLICT (collection, natural_key) DO UPDATE SET doc = EXCLUDED.doc";

/// [`DocumentStore`] over a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: Pool,
}

impl PgDocumentStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Create the documents table and its containment index if missing.
    pub async fn ensure_schema(&self) -> PaddockResult<()> {
        let client = self.pool.get().await.map_err(pool_error)?;
        client
            .batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| write_error("paddock_documents", e))?;
        Ok(())
    }
}

fn pool_error(err: PoolError) -> StorageError {
    StorageError::Unavailable {
        reason: err.to_string(),
    }
}

fn query_error(collection: &str, err: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        collection: collection.to_string(),
        reason: err.to_string(),
    }
}

fn write_error(collection: &str, err: tokio_postgres::Error) -> StorageError {
    StorageError::WriteFailed {
        collection: collection.to_string(),
        reason: err.to_string(),
    }
}

/// A stored value that is not a JSON object decodes as an empty document,
/// which the mapper turns into an all-zero entity.
fn into_document(value: JsonValue) -> Document {
    match value {
        JsonValue::Object(map) => map,
        _ => Document::new(),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self, filter))]
    async fn find(&self, collection: &str, filter: &Filter) -> PaddockResult<Vec<Document>> {
        let client = self.pool.get().await.map_err(pool_error)?;
        let containment = JsonValue::Object(filter.clone());

        let rows = client
            .query(FIND_SQL, &[&collection, &containment])
            .await
            .map_err(|e| query_error(collection, e))?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let value: JsonValue = row.try_get(0).map_err(|e| query_error(collection, e))?;
            docs.push(into_document(value));
        }

        debug!(collection, count = docs.len(), "documents found");
        Ok(docs)
    }

    #[instrument(skip(self, batch), fields(batch_len = batch.len()))]
    async fn bulk_upsert(&self, collection: &str, batch: Vec<Upsert>) -> PaddockResult<u64> {
        let mut client = self.pool.get().await.map_err(pool_error)?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| write_error(collection, e))?;

        let mut affected = 0u64;
        for upsert in batch {
            let key = natural_key(&upsert.filter);
            let doc = JsonValue::Object(upsert.document);
            affected += tx
                .execute(UPSERT_SQL, &[&collection, &key, &doc])
                .await
                .map_err(|e| write_error(collection, e))?;
        }

        tx.commit().await.map_err(|e| write_error(collection, e))?;
        Ok(affected)
    }

    async fn ping(&self) -> PaddockResult<()> {
        let client = self.pool.get().await.map_err(pool_error)?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StorageError::Unavailable {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
