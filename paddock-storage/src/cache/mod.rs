//! Cache layer: query-shaped keys, cache-aside reads and backends.
//!
//! The cache holds serialized snapshots of whole query results, one per
//! [`CacheKey`]. Freshness is bounded by a fixed TTL plus key deletion on
//! writes; there is no cross-replica invalidation and no refresh-ahead.
//! Concurrent misses on one key may each hit the store and each rewrite
//! the entry with the same value.

pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod read_through;

pub use key::{CacheKey, CacheKeyParseError};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use memory::InMemoryCacheBackend;
pub use read_through::{CacheAsideResolver, CacheConfig};
