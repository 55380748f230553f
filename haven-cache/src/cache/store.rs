//! Strategy Store - Bounded Map with TTL and Eviction
//!
//! `TigerStyle`: Explicit limits, caller-supplied time, inline eviction.
//!
//! # Design
//!
//! One store per named strategy. Every method takes `now_ms` from the caller
//! so the store itself has no clock; the coordinator reads a [`Clock`] and
//! tests pass `SimClock` time straight through.
//!
//! Expired entries are removed lazily when touched, or in bulk by
//! [`StrategyStore::purge_expired`]. Until then they still count toward
//! `len()` and `memory_usage()`.
//!
//! [`Clock`]: crate::clock::Clock

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::entry::{CacheEntry, Priority};
use super::metrics::{CachePerformanceMetrics, MetricsRecorder};
use super::strategy::CacheStrategy;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a write into a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    /// Keys evicted to make room, in eviction order
    pub evicted: Vec<String>,
    /// Whether an existing entry under the same key was overwritten
    pub replaced: bool,
}

/// Result of a read that does not touch metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Live entry; hit bookkeeping already applied
    Hit(T),
    /// No entry under this key
    Miss,
    /// Entry was past its expiry and has been removed
    Expired,
}

// =============================================================================
// Strategy Store
// =============================================================================

/// Bounded in-memory map for one strategy.
///
/// `TigerStyle`:
/// - `len() <= max_entries` after every write
/// - `memory_usage()` is summed from held entries on demand, never tracked
/// - Logical sequence numbers make eviction order independent of map order
/// - A retired store is unreachable from the registry and refuses writes
#[derive(Debug)]
pub struct StrategyStore<T> {
    config: Arc<CacheStrategy>,
    entries: HashMap<String, CacheEntry<T>>,
    metrics: MetricsRecorder,
    next_seq: u64,
    retired: bool,
}

impl<T> StrategyStore<T> {
    /// Create an empty store.
    ///
    /// # Panics
    /// Panics if the strategy has zero capacity or zero TTL.
    #[must_use]
    pub fn new(config: Arc<CacheStrategy>) -> Self {
        // Preconditions
        assert!(config.max_entries > 0, "max_entries must be positive");
        assert!(config.ttl_ms > 0, "ttl_ms must be positive");

        Self {
            config,
            entries: HashMap::new(),
            metrics: MetricsRecorder::new(),
            next_seq: 0,
            retired: false,
        }
    }

    /// Current strategy configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<CacheStrategy> {
        &self.config
    }

    /// Strategy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Mark the store as removed from the registry.
    ///
    /// # Panics
    /// Panics if the store still holds entries.
    pub fn retire(&mut self) {
        // Precondition
        assert!(self.entries.is_empty(), "cannot retire a non-empty store");
        self.retired = true;
    }

    /// Whether the store was removed from the registry.
    ///
    /// Callers holding a stale handle must not write into a retired store.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write `data` under `key`, evicting if a new key would exceed capacity.
    ///
    /// Overwriting is a fresh write: hit count resets and expiry restarts.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        data: T,
        priority: Priority,
        size_bytes: usize,
        now_ms: u64,
    ) -> SetOutcome {
        let entry = CacheEntry::new(key, data, priority, size_bytes, now_ms, self.config.ttl_ms);
        self.insert(entry)
    }

    /// Re-insert an entry loaded from the durable store.
    ///
    /// Creation and expiry times are kept; the restore counts as one read.
    ///
    /// # Panics
    /// Panics if the entry is already expired at `now_ms`.
    pub fn restore(&mut self, mut entry: CacheEntry<T>, now_ms: u64) -> SetOutcome {
        // Precondition
        assert!(!entry.is_expired(now_ms), "cannot restore an expired entry");

        entry.hit_count = 1;
        entry.last_accessed_ms = now_ms.max(entry.created_at_ms);
        self.insert(entry)
    }

    fn insert(&mut self, mut entry: CacheEntry<T>) -> SetOutcome {
        let replaced = self.entries.remove(&entry.key).is_some();

        let evicted = if !replaced && self.entries.len() >= self.config.max_entries {
            let count = self.entries.len() - self.config.max_entries + 1;
            self.evict(count)
        } else {
            Vec::new()
        };

        let seq = self.next_seq();
        entry.insert_seq = seq;
        entry.access_seq = seq;
        self.entries.insert(entry.key.clone(), entry);

        // Postcondition
        assert!(
            self.entries.len() <= self.config.max_entries,
            "capacity invariant violated for {}",
            self.config.name
        );

        SetOutcome { evicted, replaced }
    }

    fn evict(&mut self, count: usize) -> Vec<String> {
        let victims = self
            .config
            .eviction_policy
            .select_victims(self.entries.values(), count);

        for key in &victims {
            if self.entries.remove(key).is_some() {
                debug!(
                    strategy = %self.config.name,
                    key = %key,
                    policy = %self.config.eviction_policy,
                    "evicted entry"
                );
            }
        }
        self.metrics.record_evictions(victims.len());
        victims
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read `key`, removing it if expired. Does not touch metrics.
    pub fn lookup(&mut self, key: &str, now_ms: u64) -> Lookup<T>
    where
        T: Clone,
    {
        let expired = match self.entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) => entry.is_expired(now_ms),
        };

        if expired {
            self.remove_entry(key);
            debug!(strategy = %self.config.name, key = %key, "expired on read");
            return Lookup::Expired;
        }

        let seq = self.next_seq();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.record_hit(now_ms, seq);
                Lookup::Hit(entry.data.clone())
            }
            None => Lookup::Miss,
        }
    }

    /// Read `key` and record a hit or miss.
    pub fn get(&mut self, key: &str, now_ms: u64) -> Option<T>
    where
        T: Clone,
    {
        match self.lookup(key, now_ms) {
            Lookup::Hit(data) => {
                self.metrics.record_hit();
                Some(data)
            }
            Lookup::Miss | Lookup::Expired => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Entry under `key`, expired or not, without bookkeeping.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Whether `key` is held, expired or not.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Held keys in unspecified order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // =========================================================================
    // Removal
    // =========================================================================

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.remove(key)
    }

    /// Remove `key`. Returns whether it was held.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Remove every entry. Metrics are kept.
    pub fn clear(&mut self) -> Vec<String> {
        self.entries.drain().map(|(key, _)| key).collect()
    }

    /// Remove every entry expired at `now_ms`.
    pub fn purge_expired(&mut self, now_ms: u64) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now_ms))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        if !expired.is_empty() {
            debug!(
                strategy = %self.config.name,
                count = expired.len(),
                "purged expired entries"
            );
        }
        expired
    }

    // =========================================================================
    // Configuration and Metrics
    // =========================================================================

    /// Swap in a new configuration, returning the old one.
    ///
    /// A shrunk capacity evicts immediately; the evicted keys are returned.
    ///
    /// # Panics
    /// Panics if the name changes or the new strategy has zero capacity or TTL.
    pub fn replace_config(
        &mut self,
        config: Arc<CacheStrategy>,
    ) -> (Arc<CacheStrategy>, Vec<String>) {
        // Preconditions
        assert_eq!(config.name, self.config.name, "strategy name must not change");
        assert!(config.max_entries > 0, "max_entries must be positive");
        assert!(config.ttl_ms > 0, "ttl_ms must be positive");

        let old = std::mem::replace(&mut self.config, config);
        let evicted = if self.entries.len() > self.config.max_entries {
            let count = self.entries.len() - self.config.max_entries;
            self.evict(count)
        } else {
            Vec::new()
        };
        (old, evicted)
    }

    /// Count a hit observed by the coordinator.
    pub fn record_hit(&mut self) {
        self.metrics.record_hit();
    }

    /// Count a miss observed by the coordinator.
    pub fn record_miss(&mut self) {
        self.metrics.record_miss();
    }

    /// Zero the counters.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Snapshot of counters plus current size.
    #[must_use]
    pub fn metrics(&self) -> CachePerformanceMetrics {
        self.metrics.snapshot(self.memory_usage(), self.entries.len())
    }

    /// Sum of held entry sizes, including not-yet-purged expired entries.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(|entry| entry.size_bytes).sum()
    }

    /// Number of held entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
