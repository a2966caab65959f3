//! Cache storage: the store capability and the in-memory implementation.
//!
//! Entries expire by TTL only; there is no LRU layer and no explicit
//! eviction owned by this subsystem. An expired entry is indistinguishable
//! from an absent one.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache entry could not be serialized: {0}")]
    Serialization(String),
}

/// A captured HTTP response, stored verbatim.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Capability over an expiring key/value store.
///
/// A single get or put is atomic; no cross-operation transactions are
/// required. Errors are values the middleware downgrades from, never
/// surfaced to API callers.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredResponse>, StoreError>;

    async fn put(
        &self,
        key: &str,
        response: StoredResponse,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}

/// Time source for expiry checks, abstracted so tests can advance time
/// without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually-advanced clock for TTL tests.
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|poisoned| {
            // A panicked test thread left the lock poisoned; the offset is
            // still valid.
            poisoned.into_inner()
        });
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self
            .offset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.origin + *offset
    }
}

struct StoredEntry {
    response: StoredResponse,
    expires_at: Instant,
}

/// In-memory store with per-entry TTL expiry.
///
/// Expired entries are removed lazily on the next read of their key.
pub struct MemoryStore {
    entries: DashMap<String, StoredEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredResponse>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > self.clock.now() {
                return Ok(Some(entry.response.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        response: StoredResponse,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let entry = StoredEntry {
            response,
            expires_at: self.clock.now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// A store whose backend is unreachable. Exercises the degradation path:
/// the middleware must pass straight through to the handler.
pub struct UnavailableStore;

#[async_trait]
impl ResponseStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<StoredResponse>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn put(
        &self,
        _key: &str,
        _response: StoredResponse,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
