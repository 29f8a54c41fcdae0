//! In-process TTL cache for lookups that rarely change
//!
//! Accounts and operation types are read on every `make_transaction`; both
//! are immutable once written, so a stale entry is never wrong, only late to
//! expire.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Cache TTL defaults (in seconds)
pub mod ttl {
    /// Account lookups: 10 minutes
    pub const ACCOUNT: u64 = 600;
    /// Operation types: 6 hours
    pub const OPERATION_TYPE: u64 = 21_600;
}

/// Hit and miss counters
#[derive(Default, Debug)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    /// Lookups served from the cache
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing fresh
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate in percent
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64) / (total as f64) * 100.0
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Concurrent map whose entries expire after a fixed TTL
pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
    metrics: CacheMetrics,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            metrics: CacheMetrics::default(),
        }
    }

    /// Fresh value for `key`, dropping it when expired
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }

        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or refresh an entry
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop an entry
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Entries held, expired ones included until next touched
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries held
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit and miss counters
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}
