//! Object Cache Module
//!
//! Main cache engine: a fixed set of entry slots with a byte budget and
//! LRU eviction driven by recency ticks.

use tracing::{debug, info};

use crate::cache::lru::{least_recent, RecencyClock};
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{ProxyError, Result};

// == Object Cache ==
/// Bounded store of origin responses keyed by request URI.
///
/// Not synchronized on its own; concurrent users go through
/// [`SharedCache`](crate::cache::SharedCache).
#[derive(Debug)]
pub struct ObjectCache {
    /// Resident entries in insertion order
    entries: Vec<CacheEntry>,
    /// Number of entry slots, fixed at construction
    capacity: usize,
    /// Sum of resident payload sizes
    total_size: usize,
    /// Byte budget for all entries together
    max_cache_size: usize,
    /// Largest payload accepted for a single entry
    max_object_size: usize,
    /// Source of recency ticks
    clock: RecencyClock,
    /// Performance statistics
    stats: CacheStats,
}

impl ObjectCache {
    // == Constructor ==
    /// Creates an empty cache with `max_cache_size / max_object_size` slots.
    ///
    /// # Arguments
    /// * `max_cache_size` - Byte budget for all entries together
    /// * `max_object_size` - Largest payload a single entry may hold
    ///
    /// # Errors
    /// Returns [`ProxyError::Allocation`] when the limits leave no room for a
    /// single object or the slot array cannot be reserved.
    pub fn new(max_cache_size: usize, max_object_size: usize) -> Result<Self> {
        if max_object_size == 0 || max_object_size > max_cache_size {
            return Err(ProxyError::Allocation(format!(
                "object size limit {} does not fit cache size {}",
                max_object_size, max_cache_size
            )));
        }

        let capacity = max_cache_size / max_object_size;
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|e| ProxyError::Allocation(e.to_string()))?;

        Ok(Self {
            entries,
            capacity,
            total_size: 0,
            max_cache_size,
            max_object_size,
            clock: RecencyClock::new(),
            stats: CacheStats::new(),
        })
    }

    // == Lookup ==
    /// Returns a copy of the payload stored under `key`.
    ///
    /// A hit moves the entry to the most recently used position.
    pub fn lookup(&mut self, key: &str) -> Option<Vec<u8>> {
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                let tick = self.clock.tick();
                let entry = &mut self.entries[index];
                entry.touch(tick);
                self.stats.record_hit();
                Some(entry.payload.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Store ==
    /// Inserts `payload` under `key`, evicting least recently used entries
    /// until it fits.
    ///
    /// Payloads larger than the object size limit are ignored. An existing
    /// entry with the same key is replaced, never duplicated.
    ///
    /// # Returns
    /// `true` if the payload is now resident.
    pub fn store(&mut self, key: String, payload: Vec<u8>) -> bool {
        let size = payload.len();
        if size > self.max_object_size {
            debug!(key = %key, size, "Object too large to cache");
            self.stats.record_rejection();
            return false;
        }

        if let Some(index) = self.entries.iter().position(|entry| entry.key == key) {
            let previous = self.entries.remove(index);
            self.total_size -= previous.size();
        }

        while self.total_size + size > self.max_cache_size || self.entries.len() >= self.capacity {
            if self.evict().is_none() {
                break;
            }
        }

        let tick = self.clock.tick();
        debug!(key = %key, size, tick, "Storing cache entry");
        self.entries.push(CacheEntry::new(key, payload, tick));
        self.total_size += size;
        self.stats.record_store();
        true
    }

    // == Evict ==
    /// Removes the least recently used entry.
    ///
    /// # Returns
    /// The evicted key, or None if the cache was empty.
    pub fn evict(&mut self) -> Option<String> {
        let index = least_recent(&self.entries)?;
        let victim = self.entries.remove(index);
        self.total_size -= victim.size();
        self.stats.record_eviction();
        info!("Evicting cache entry: {}", victim.key);
        Some(victim.key)
    }

    // == Contains ==
    /// Checks residency without counting a hit or touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.entries.len(), self.total_size);
        stats
    }

    /// Resident entries, oldest insertion first.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of resident payload sizes in bytes.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Number of entry slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }
}
