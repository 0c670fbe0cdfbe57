//! Scheduler Configuration Module
//!
//! Listener, cache and deadline settings, loaded from environment variables
//! with defaults suitable for local development. Database settings live
//! with the pool in [`crate::db`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use paddock_core::ConfigError;
use paddock_storage::CacheConfig;

/// Default RPC port.
pub const DEFAULT_PORT: u16 = 50051;

/// Service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Listener host (`PADDOCK_BIND`).
    pub bind: String,
    /// Listener port (`PADDOCK_PORT`).
    pub port: u16,
    /// LMDB directory; unset means the in-process cache (`PADDOCK_CACHE_PATH`).
    pub cache_path: Option<PathBuf>,
    /// LMDB map size in megabytes (`PADDOCK_CACHE_MAX_MB`).
    pub cache_max_mb: usize,
    /// Expiry for repopulated cache entries (`PADDOCK_CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
    /// Deadline applied to every RPC call (`PADDOCK_CALL_TIMEOUT_SECS`).
    pub call_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cache_path: None,
            cache_max_mb: 256,
            cache_ttl: Duration::from_secs(3600), // 1 hour
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            bind: lookup("PADDOCK_BIND").unwrap_or(defaults.bind),
            port: lookup("PADDOCK_PORT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.port),
            cache_path: lookup("PADDOCK_CACHE_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            cache_max_mb: lookup("PADDOCK_CACHE_MAX_MB")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.cache_max_mb),
            cache_ttl: parsed("PADDOCK_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            call_timeout: parsed("PADDOCK_CALL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
        }
    }

    /// Resolve and validate the listener address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "PADDOCK_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Resolver settings derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().with_ttl(self.cache_ttl)
    }
}
