//! LMDB-backed cache implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) as a persistent, memory-mapped
//! key-value store for cached query results.
//!
//! # Value Layout
//!
//! `[expires_at_millis: 8 bytes LE][payload]`
//!
//! An entry whose expiry has passed is reported as a miss and removed on
//! the read that finds it. A value too short to hold the header is treated
//! the same way.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for lookups
//! - Write transactions for `set`, `delete` and lazy expiry
//!
//! No transaction is held across an await point.

use std::path::Path;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use paddock_core::{CacheError, PaddockError, PaddockResult};

use crate::traits::{CacheBackend, CacheStats};

const HEADER_LEN: usize = 8;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbCacheError to PaddockError.
impl From<LmdbCacheError> for PaddockError {
    fn from(e: LmdbCacheError) -> Self {
        PaddockError::Cache(CacheError::Backend {
            reason: e.to_string(),
        })
    }
}

enum Lookup {
    Hit(Vec<u8>),
    Expired,
    Miss,
}

/// LMDB-backed [`CacheBackend`].
///
/// # Example
///
/// ```ignore
/// use paddock_storage::cache::LmdbCacheBackend;
///
/// let backend = LmdbCacheBackend::new("/var/cache/paddock", 256)?;
/// backend.set("seasons:all", payload, Duration::from_secs(3600)).await?;
/// let cached = backend.get("seasons:all").await?;
/// ```
pub struct LmdbCacheBackend {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    /// Hit/miss counters.
    stats: RwLock<CacheStats>,
}

impl LmdbCacheBackend {
    /// Create a new LMDB cache backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(Self {
            env,
            db,
            stats: RwLock::new(CacheStats::default()),
        })
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }

    fn lookup(&self, key: &[u8], now_millis: i64) -> Result<Lookup, LmdbCacheError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let bytes = match self
            .db
            .get(&rtxn, key)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?
        {
            Some(bytes) => bytes,
            None => return Ok(Lookup::Miss),
        };

        let Some((header, payload)) = bytes.split_first_chunk::<HEADER_LEN>() else {
            return Ok(Lookup::Expired);
        };
        if i64::from_le_bytes(*header) <= now_millis {
            return Ok(Lookup::Expired);
        }
        Ok(Lookup::Hit(payload.to_vec()))
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<(), LmdbCacheError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))
    }

    fn remove(&self, key: &[u8]) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        let deleted = self
            .db
            .delete(&mut wtxn, key)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;

        Ok(deleted)
    }

    fn entry_count(&self) -> Result<u64, LmdbCacheError> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))?;
        self.db
            .len(&rtxn)
            .map_err(|e| LmdbCacheError::Transaction(e.to_string()))
    }
}

fn expiry_millis(now_millis: i64, ttl: Duration) -> i64 {
    let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_millis.saturating_add(ttl_millis)
}

#[async_trait]
impl CacheBackend for LmdbCacheBackend {
    async fn get(&self, key: &str) -> PaddockResult<Option<Vec<u8>>> {
        let now_millis = Utc::now().timestamp_millis();

        match self.lookup(key.as_bytes(), now_millis)? {
            Lookup::Hit(payload) => {
                self.record(|s| s.hits += 1);
                Ok(Some(payload))
            }
            Lookup::Expired => {
                self.remove(key.as_bytes())?;
                self.record(|s| {
                    s.misses += 1;
                    s.expirations += 1;
                });
                Ok(None)
            }
            Lookup::Miss => {
                self.record(|s| s.misses += 1);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PaddockResult<()> {
        let expires_at = expiry_millis(Utc::now().timestamp_millis(), ttl);

        let mut full_bytes = Vec::with_capacity(HEADER_LEN + value.len());
        full_bytes.extend_from_slice(&expires_at.to_le_bytes());
        full_bytes.extend_from_slice(&value);

        self.write(key.as_bytes(), &full_bytes)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> PaddockResult<bool> {
        Ok(self.remove(key.as_bytes())?)
    }

    async fn stats(&self) -> PaddockResult<CacheStats> {
        let mut stats = self
            .stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();
        stats.entry_count = self.entry_count()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_backend() -> (LmdbCacheBackend, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let backend =
            LmdbCacheBackend::new(temp_dir.path(), 10).expect("backend creation should succeed");
        (backend, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (backend, _temp_dir) = create_test_backend();

        backend
            .set("rounds:2024", b"{\"rounds\":[]}".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");

        let cached = backend.get("rounds:2024").await.expect("get should succeed");
        assert_eq!(cached.as_deref(), Some(&b"{\"rounds\":[]}"[..]));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (backend, _temp_dir) = create_test_backend();
        let cached = backend.get("seasons:1950").await.expect("get should succeed");
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let (backend, _temp_dir) = create_test_backend();

        backend
            .set("seasons:all", b"x".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");
        assert!(backend.delete("seasons:all").await.expect("delete should succeed"));
        assert!(!backend.delete("seasons:all").await.expect("delete should succeed"));
        assert!(backend
            .get("seasons:all")
            .await
            .expect("get should succeed")
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let (backend, _temp_dir) = create_test_backend();

        backend
            .set("rounds:2024:1", b"x".to_vec(), Duration::from_millis(5))
            .await
            .expect("set should succeed");
        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(backend
            .get("rounds:2024:1")
            .await
            .expect("get should succeed")
            .is_none());

        let stats = backend.stats().await.expect("stats should succeed");
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entry_count, 0);
    }

    #[tokio::test]
    async fn test_truncated_value_is_a_miss() {
        let (backend, _temp_dir) = create_test_backend();
        backend.write(b"seasons:all", b"abc").expect("raw write should succeed");

        assert!(backend
            .get("seasons:all")
            .await
            .expect("get should succeed")
            .is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let (backend, _temp_dir) = create_test_backend();

        backend
            .set("seasons:2024", b"old".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");
        backend
            .set("seasons:2024", b"new".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");

        let cached = backend.get("seasons:2024").await.expect("get should succeed");
        assert_eq!(cached.as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test]
    async fn test_stats() {
        let (backend, _temp_dir) = create_test_backend();

        let _ = backend.get("seasons:all").await;
        backend
            .set("seasons:all", b"x".to_vec(), Duration::from_secs(60))
            .await
            .expect("set should succeed");
        let _ = backend.get("seasons:all").await;
        let _ = backend.get("seasons:all").await;

        let stats = backend.stats().await.expect("stats should succeed");
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_expiry_saturates() {
        assert_eq!(expiry_millis(1_000, Duration::from_millis(500)), 1_500);
        assert_eq!(expiry_millis(i64::MAX - 1, Duration::from_secs(10)), i64::MAX);
    }
}
