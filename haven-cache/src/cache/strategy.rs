//! Cache Strategy - Named Configuration
//!
//! `TigerStyle`: Immutable once shared, replaced wholesale on change.

use serde::{Deserialize, Serialize};

use super::eviction::EvictionPolicy;
use crate::constants::{
    CACHE_ENTRIES_COUNT_DEFAULT, CACHE_ENTRIES_COUNT_MAX, CACHE_STRATEGY_NAME_BYTES_MAX,
    CACHE_TTL_MS_DEFAULT, CACHE_TTL_MS_MAX, DURABLE_KEY_SEPARATOR,
};
use crate::error::{CacheError, CacheResult};

/// Configuration of one named cache.
///
/// Stores hold it behind an `Arc`; the optimizer and `reconfigure` build a
/// new value and swap it in rather than editing fields in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStrategy {
    /// Unique strategy name
    pub name: String,
    /// Capacity bound
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Time-to-live applied to each write (ms)
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Victim selection when at capacity
    #[serde(default)]
    pub eviction_policy: EvictionPolicy,
    /// LZ4-compress persisted envelopes above the coordinator threshold
    #[serde(default)]
    pub compression_enabled: bool,
    /// Mirror writes into the durable store
    #[serde(default)]
    pub persist_to_durable_store: bool,
}

fn default_max_entries() -> usize {
    CACHE_ENTRIES_COUNT_DEFAULT
}

fn default_ttl_ms() -> u64 {
    CACHE_TTL_MS_DEFAULT
}

impl CacheStrategy {
    /// Create a strategy with default capacity, TTL and LRU eviction.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_entries: CACHE_ENTRIES_COUNT_DEFAULT,
            ttl_ms: CACHE_TTL_MS_DEFAULT,
            eviction_policy: EvictionPolicy::default(),
            compression_enabled: false,
            persist_to_durable_store: false,
        }
    }

    /// Set the capacity bound.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the time-to-live.
    #[must_use]
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Set the eviction policy.
    #[must_use]
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Enable or disable compression of persisted envelopes.
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression_enabled = enabled;
        self
    }

    /// Enable or disable durable persistence.
    #[must_use]
    pub fn with_persistence(mut self, enabled: bool) -> Self {
        self.persist_to_durable_store = enabled;
        self
    }

    /// Check bounds.
    ///
    /// # Errors
    /// Returns `InvalidStrategy` describing the first violated bound.
    pub fn validate(&self) -> CacheResult<()> {
        let invalid = |reason: String| Err(CacheError::invalid_strategy(&self.name, reason));

        if self.name.is_empty() {
            return invalid("name is empty".to_string());
        }
        if self.name.len() > CACHE_STRATEGY_NAME_BYTES_MAX {
            return invalid(format!(
                "name is {} bytes, max {CACHE_STRATEGY_NAME_BYTES_MAX}",
                self.name.len()
            ));
        }
        if self.name.contains(DURABLE_KEY_SEPARATOR) {
            return invalid(format!("name must not contain '{DURABLE_KEY_SEPARATOR}'"));
        }
        if self.max_entries == 0 || self.max_entries > CACHE_ENTRIES_COUNT_MAX {
            return invalid(format!(
                "max_entries {} outside 1..={CACHE_ENTRIES_COUNT_MAX}",
                self.max_entries
            ));
        }
        if self.ttl_ms == 0 || self.ttl_ms > CACHE_TTL_MS_MAX {
            return invalid(format!(
                "ttl_ms {} outside 1..={CACHE_TTL_MS_MAX}",
                self.ttl_ms
            ));
        }
        Ok(())
    }
}
