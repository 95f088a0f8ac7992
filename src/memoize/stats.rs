//! Per-memoizer hit/miss accounting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters updated by every invocation of a memoized function.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    write_failures: AtomicU64,
}

impl Stats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bypass(&self) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a memoizer's counters.
///
/// Serializable so it can be dropped straight into a status or health payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Calls answered from the cache.
    pub hits: u64,
    /// Calls that found nothing and ran the computation.
    pub misses: u64,
    /// Calls the skip predicate routed straight to the computation.
    pub bypasses: u64,
    /// Cache writes that returned an error.
    pub write_failures: u64,
}

impl StatsSnapshot {
    /// Fraction of cache lookups that hit, from `0.0` to `1.0`.
    ///
    /// Bypassed calls never touch the cache and are not counted.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
