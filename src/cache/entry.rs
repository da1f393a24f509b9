//! Cache Entry Module
//!
//! Defines a single cached origin response.

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A cached response keyed by the request URI it answered.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Request URI exactly as the client sent it
    pub key: String,
    /// Raw response bytes (status line, headers and body)
    pub payload: Vec<u8>,
    /// Recency tick of the last store or hit
    pub recency: u64,
    /// When the response was stored
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the given recency tick.
    pub fn new(key: String, payload: Vec<u8>, recency: u64) -> Self {
        Self {
            key,
            payload,
            recency,
            stored_at: Utc::now(),
        }
    }

    // == Size ==
    /// Size of the stored payload in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    // == Touch ==
    /// Records an access at the given recency tick.
    pub fn touch(&mut self, recency: u64) {
        self.recency = recency;
    }
}
