//! LRU Module
//!
//! Recency clock and victim selection for least-recently-used eviction.

use crate::cache::CacheEntry;

// == Recency Clock ==
/// Monotonically increasing counter handing out recency ticks.
///
/// Every store and every hit takes a fresh tick, so the entry holding the
/// smallest tick is the least recently used one.
#[derive(Debug, Default)]
pub struct RecencyClock {
    /// Last tick handed out
    now: u64,
}

impl RecencyClock {
    // == Constructor ==
    /// Creates a clock that has not ticked yet.
    pub fn new() -> Self {
        Self { now: 0 }
    }

    // == Tick ==
    /// Advances the clock and returns the new tick.
    pub fn tick(&mut self) -> u64 {
        self.now += 1;
        self.now
    }

    // == Now ==
    /// Returns the last tick handed out without advancing.
    pub fn now(&self) -> u64 {
        self.now
    }
}

// == Least Recent ==
/// Returns the index of the entry with the smallest recency tick.
///
/// Ties go to the entry found first in scan order. Returns None for an
/// empty slice.
pub fn least_recent(entries: &[CacheEntry]) -> Option<usize> {
    let mut victim: Option<(usize, u64)> = None;

    for (index, entry) in entries.iter().enumerate() {
        match victim {
            Some((_, min)) if entry.recency >= min => {}
            _ => victim = Some((index, entry.recency)),
        }
    }

    victim.map(|(index, _)| index)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, recency: u64) -> CacheEntry {
        CacheEntry::new(key.to_string(), Vec::new(), recency)
    }

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = RecencyClock::new();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = RecencyClock::new();

        let first = clock.tick();
        let second = clock.tick();
        let third = clock.tick();

        assert!(first < second && second < third);
        assert_eq!(clock.now(), third);
    }

    #[test]
    fn test_least_recent_empty() {
        assert_eq!(least_recent(&[]), None);
    }

    #[test]
    fn test_least_recent_picks_minimum() {
        let entries = vec![entry("a", 5), entry("b", 2), entry("c", 7)];
        assert_eq!(least_recent(&entries), Some(1));
    }

    #[test]
    fn test_least_recent_tie_goes_to_first() {
        let entries = vec![entry("a", 4), entry("b", 3), entry("c", 3)];
        assert_eq!(least_recent(&entries), Some(1));
    }

    #[test]
    fn test_least_recent_single_entry() {
        let entries = vec![entry("only", 42)];
        assert_eq!(least_recent(&entries), Some(0));
    }
}
