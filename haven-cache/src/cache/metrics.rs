//! Metrics Recorder - Per-Strategy Counters
//!
//! `TigerStyle`: Counters only move forward; reset is an explicit operator action.
//!
//! The recorder lives inside a strategy store and is mutated under the
//! store lock, so plain integers are enough.

use serde::{Deserialize, Serialize};

/// Snapshot of one strategy's performance counters.
///
/// `total_requests == hits + misses` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePerformanceMetrics {
    /// Reads that returned a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// hits + misses
    pub total_requests: u64,
    /// Entries removed to respect the capacity bound
    pub eviction_count: u64,
    /// Sum of live entry sizes at snapshot time
    pub memory_usage_bytes: usize,
    /// Entries held at snapshot time
    pub entry_count: usize,
}

impl CachePerformanceMetrics {
    /// Fraction of requests that were hits, 0.0 with no requests.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.total_requests.max(1) as f64
    }

    /// Evictions per request, 0.0 with no requests.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eviction_rate(&self) -> f64 {
        self.eviction_count as f64 / self.total_requests.max(1) as f64
    }
}

/// Mutable counters owned by a strategy store.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl MetricsRecorder {
    /// Create a zeroed recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a hit.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Count a miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Count `count` evictions.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Build a snapshot, with memory and entry count supplied by the store.
    #[must_use]
    pub fn snapshot(&self, memory_usage_bytes: usize, entry_count: usize) -> CachePerformanceMetrics {
        let snapshot = CachePerformanceMetrics {
            hits: self.hits,
            misses: self.misses,
            total_requests: self.hits + self.misses,
            eviction_count: self.evictions,
            memory_usage_bytes,
            entry_count,
        };

        // Postcondition
        assert_eq!(
            snapshot.total_requests,
            snapshot.hits + snapshot.misses,
            "total_requests must equal hits + misses"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rates_are_zero() {
        let metrics = MetricsRecorder::new().snapshot(0, 0);
        assert_eq!(metrics.total_requests, 0);
        assert!(metrics.hit_rate().abs() < f64::EPSILON);
        assert!(metrics.eviction_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_counts_and_rates() {
        let mut recorder = MetricsRecorder::new();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();
        recorder.record_evictions(2);

        let metrics = recorder.snapshot(128, 3);
        assert_eq!(metrics.hits, 3);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.eviction_count, 2);
        assert_eq!(metrics.memory_usage_bytes, 128);
        assert_eq!(metrics.entry_count, 3);
        assert!((metrics.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert!((metrics.eviction_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let mut recorder = MetricsRecorder::new();
        recorder.record_hit();
        recorder.record_evictions(1);
        recorder.reset();

        assert_eq!(recorder.snapshot(0, 0), CachePerformanceMetrics::default());
    }
}
