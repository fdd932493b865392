//! Generic in-memory key→value cache with an optional entry-count limit.
//!
//! ## Eviction
//!
//! Entries are ordered by when they were last *written*. Reads never change
//! that order, so when a count limit is set the entry evicted first is the
//! one inserted (or overwritten) longest ago.
//!
//! ## Concurrency
//!
//! Reads take `&self` and can run concurrently; writes take `&mut self`.
//! Callers sharing a cache between threads wrap it in a `Mutex` or
//! `RwLock`.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Generic memoization cache.
pub struct Cache<K, V> {
    entries: LruCache<K, V>,
    count_limit: Option<NonZeroUsize>,
    stats: CacheStats,
}

/// Statistics for a [`Cache`].
///
/// Counters are atomic so reads can record hits and misses through `&self`.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Total lookups that found an entry
    pub hits: AtomicU64,
    /// Total lookups that found nothing
    pub misses: AtomicU64,
    /// Total entries removed by the count limit
    pub evictions: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

impl<K: Hash + Eq, V> Cache<K, V> {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: LruCache::unbounded(),
            count_limit: None,
            stats: CacheStats::default(),
        }
    }

    /// Create a cache holding at most `limit` entries.
    pub fn with_count_limit(limit: NonZeroUsize) -> Self {
        Self {
            count_limit: Some(limit),
            ..Self::new()
        }
    }

    /// Enable, change or disable (`None`) the count limit.
    ///
    /// Shrinking below the current size evicts the oldest entries
    /// immediately.
    pub fn set_count_limit(&mut self, limit: Option<NonZeroUsize>) {
        self.count_limit = limit;
        let evicted = self.enforce_limit();
        if evicted > 0 {
            debug!(evicted = evicted, limit = ?limit, "Cache shrunk to new count limit");
        }
    }

    pub fn count_limit(&self) -> Option<NonZeroUsize> {
        self.count_limit
    }

    /// Look up a value. Does not change eviction order.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.entries.peek(key) {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value, replacing any existing value for the key and making
    /// it the newest entry.
    ///
    /// Returns the entry evicted to stay within the count limit, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.put(key, value).is_some() {
            // Overwrite: size unchanged
            return None;
        }

        let limit = self.count_limit?;
        if self.entries.len() <= limit.get() {
            return None;
        }

        let evicted = self.entries.pop_lru();
        if evicted.is_some() {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(
                limit = limit.get(),
                size = self.entries.len(),
                "Evicted oldest cache entry"
            );
        }
        evicted
    }

    /// Check for a key without touching statistics or order.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Remove an entry, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn enforce_limit(&mut self) -> usize {
        let Some(limit) = self.count_limit else {
            return 0;
        };
        let mut evicted = 0;
        while self.entries.len() > limit.get() {
            if self.entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        self.stats
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }
}

impl<K: Hash + Eq, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
