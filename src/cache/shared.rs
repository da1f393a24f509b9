//! Shared Cache Handle
//!
//! Cloneable handle giving concurrent workers serialized access to one
//! [`ObjectCache`].

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, ObjectCache};
use crate::config::Config;
use crate::error::Result;

// == Shared Cache ==
/// Thread-safe handle to a single cache instance.
///
/// Lookup, store and evict each run under the write lock, so the recency
/// clock and the size accounting are never observed half-updated.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<RwLock<ObjectCache>>,
    /// Copied out so relays can size their buffers without locking
    max_object_size: usize,
}

impl SharedCache {
    /// Wraps an existing cache.
    pub fn new(cache: ObjectCache) -> Self {
        Self {
            max_object_size: cache.max_object_size(),
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = ObjectCache::new(config.max_cache_size, config.max_object_size)?;
        Ok(Self::new(cache))
    }

    // == Lookup ==
    /// Returns a copy of the cached payload for `key`, if resident.
    pub async fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        // Write lock: a hit bumps recency.
        let mut cache = self.inner.write().await;
        cache.lookup(key)
    }

    // == Store ==
    /// Inserts a payload; returns `true` if it became resident.
    pub async fn store(&self, key: String, payload: Vec<u8>) -> bool {
        let mut cache = self.inner.write().await;
        cache.store(key, payload)
    }

    // == Evict ==
    /// Evicts the least recently used entry, returning its key.
    pub async fn evict(&self) -> Option<String> {
        let mut cache = self.inner.write().await;
        cache.evict()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.read().await.contains(key)
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn total_size(&self) -> usize {
        self.inner.read().await.total_size()
    }

    /// Maximum payload the cache accepts; used to cap relay buffers.
    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }
}
