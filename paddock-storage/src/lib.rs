//! PADDOCK Storage - Cache-Aside Data Access
//!
//! Store and cache capability traits, the document mapper, the cache-aside
//! resolver and the write/invalidate coordinator. Concrete durable stores
//! live with the service that owns their connections; this crate ships an
//! in-memory store plus in-memory and LMDB cache backends.

pub mod cache;
pub mod document;
pub mod mapper;
pub mod memory_store;
pub mod traits;
pub mod write;

pub use cache::{
    CacheAsideResolver, CacheConfig, CacheKey, CacheKeyParseError, InMemoryCacheBackend,
    LmdbCacheBackend, LmdbCacheError,
};
pub use document::{Document, Filter, Upsert};
pub use mapper::{
    decode_payload, encode_payload, CachedResultSet, DocumentRecord, StoredEntity,
    ROUNDS_COLLECTION, SEASONS_COLLECTION,
};
pub use memory_store::InMemoryDocumentStore;
pub use traits::{CacheBackend, CacheStats, DocumentStore};
pub use write::WriteCoordinator;
