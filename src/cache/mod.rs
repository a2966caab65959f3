//! Read-through response caching.
//!
//! Composition per request: `policy` decides cacheability and the TTL
//! tier, `keys` derives the cache key, `store` holds expiring entries,
//! and `middleware` wires the three around downstream handlers.
//!
//! There is no active invalidation on write: mutating endpoints do not
//! purge read keys, and staleness is bounded by TTL alone. The volatile
//! workflow views are excluded from caching outright instead.

mod config;
mod keys;
mod middleware;
mod policy;
mod store;

pub use config::CacheConfig;
pub use keys::{KeyParts, NAMESPACE, SCHEMA_VERSION, derive as derive_key};
pub use middleware::{
    CACHE_KEY_HEADER, CACHE_STATUS_HEADER, CacheState, CallerId, METRIC_CACHE_HIT,
    METRIC_CACHE_MISS, METRIC_CACHE_STORE_ERROR, read_through,
};
pub use policy::{CacheDecision, SkipReason, decide};
pub use store::{
    Clock, ManualClock, MemoryStore, ResponseStore, StoreError, StoredResponse, SystemClock,
    UnavailableStore,
};
