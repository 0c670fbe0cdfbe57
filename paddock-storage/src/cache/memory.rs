//! In-memory cache backend with per-entry expiry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use paddock_core::{CacheError, PaddockResult};
use tokio::sync::RwLock;

use crate::traits::{CacheBackend, CacheStats};

#[derive(Debug)]
struct Entry {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// Process-local [`CacheBackend`].
///
/// `set_unavailable(true)` makes every call fail the way an unreachable
/// remote cache would.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    stats: RwLock<CacheStats>,
    unavailable: AtomicBool,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable {
                reason: "in-memory cache switched off".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> PaddockResult<Option<Vec<u8>>> {
        self.check_available()?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let mut stats = self.stats.write().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                stats.hits += 1;
                Ok(Some(entry.payload.clone()))
            }
            Some(_) => {
                entries.remove(key);
                stats.expirations += 1;
                stats.misses += 1;
                Ok(None)
            }
            None => {
                stats.misses += 1;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> PaddockResult<()> {
        self.check_available()?;

        let expires_at = Instant::now() + ttl;
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                payload: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> PaddockResult<bool> {
        self.check_available()?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn stats(&self) -> PaddockResult<CacheStats> {
        let entry_count = self.entries.read().await.len() as u64;
        let mut stats = self.stats.read().await.clone();
        stats.entry_count = entry_count;
        Ok(stats)
    }
}
