//! Cache Module
//!
//! Bounded object cache with LRU eviction for origin responses.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::{least_recent, RecencyClock};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::ObjectCache;

// == Public Constants ==
/// Default byte budget for the whole cache
pub const MAX_CACHE_SIZE: usize = 1_049_000;

/// Default size limit for a single cached response
pub const MAX_OBJECT_SIZE: usize = 102_400; // 100 KiB
