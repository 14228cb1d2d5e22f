use serde::Serialize;
use shared::Price;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Price remembered by the cache together with the moment it was fetched
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheEntry {
    pub value: Price,
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// Entry for a value that was just returned by the price source
    pub fn fetched_now(value: Price) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}

/// Decides whether a cached entry may still be served
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessPolicy {
    max_age: Duration,
}

impl FreshnessPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// An entry exactly `max_age` old is already stale
    pub fn is_fresh_at(&self, entry: &CacheEntry, now: Instant) -> bool {
        entry.age_at(now) < self.max_age
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.is_fresh_at(entry, Instant::now())
    }
}

/// Point-in-time copy of the cache counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_refreshes: u64,
    pub upstream_failures: u64,
}

impl CacheStats {
    /// Lookups that had to go to the price source
    pub fn upstream_lookups(&self) -> u64 {
        self.misses + self.stale_refreshes
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_refreshes: AtomicU64,
    upstream_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_refreshes: self.stale_refreshes.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}
