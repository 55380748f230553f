//! Coordinator Configuration
//!
//! `TigerStyle`: Sensible defaults, builder pattern, explicit over implicit.
//!
//! Configuration can be built in code or loaded from JSON:
//!
//! ```rust
//! use haven_cache::config::CacheCoordinatorConfig;
//!
//! let config = CacheCoordinatorConfig::from_json_str(
//!     r#"{
//!         "strategies": [
//!             {"name": "user_data", "max_entries": 1000, "ttl_ms": 1800000,
//!              "eviction_policy": "LRU", "persist_to_durable_store": true}
//!         ],
//!         "auto_optimization_enabled": false
//!     }"#,
//! )
//! .unwrap();
//! assert_eq!(config.strategies.len(), 1);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStrategy, EvictionPolicy};
use crate::constants::{
    CACHE_COMPRESSION_THRESHOLD_BYTES_DEFAULT, CACHE_GLOBAL_MEMORY_BYTES_DEFAULT,
    CODEC_ENVELOPE_BYTES_MAX, OPTIMIZER_CAPACITY_STEP_RATIO, OPTIMIZER_ENTRIES_COUNT_CEILING,
    OPTIMIZER_EVICTION_RATE_MAX_RATIO, OPTIMIZER_HIT_RATE_HIGH_RATIO,
    OPTIMIZER_HIT_RATE_LOW_RATIO, OPTIMIZER_INTERVAL_MS_DEFAULT, OPTIMIZER_REQUESTS_COUNT_MIN,
    OPTIMIZER_TTL_MS_CEILING, OPTIMIZER_TTL_MS_FLOOR, OPTIMIZER_TTL_STEP_RATIO, TIME_MS_PER_DAY,
    TIME_MS_PER_MIN,
};
use crate::error::{CacheError, CacheResult};

// =============================================================================
// OptimizerSettings
// =============================================================================

/// Thresholds for the auto-optimizer.
///
/// Default: the `OPTIMIZER_*` constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// TTL never shrinks below this (ms)
    pub ttl_floor_ms: u64,
    /// TTL never grows above this (ms)
    pub ttl_ceiling_ms: u64,
    /// Hit rate below which TTL shrinks
    pub hit_rate_low: f64,
    /// Hit rate above which TTL grows
    pub hit_rate_high: f64,
    /// Fraction TTL moves per pass
    pub ttl_step_ratio: f64,
    /// Eviction rate above which capacity grows
    pub eviction_rate_max: f64,
    /// Fraction capacity grows per pass
    pub capacity_step_ratio: f64,
    /// Capacity never grows above this
    pub entries_ceiling: usize,
    /// Strategies with fewer requests are skipped
    pub min_requests: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            ttl_floor_ms: OPTIMIZER_TTL_MS_FLOOR,
            ttl_ceiling_ms: OPTIMIZER_TTL_MS_CEILING,
            hit_rate_low: OPTIMIZER_HIT_RATE_LOW_RATIO,
            hit_rate_high: OPTIMIZER_HIT_RATE_HIGH_RATIO,
            ttl_step_ratio: OPTIMIZER_TTL_STEP_RATIO,
            eviction_rate_max: OPTIMIZER_EVICTION_RATE_MAX_RATIO,
            capacity_step_ratio: OPTIMIZER_CAPACITY_STEP_RATIO,
            entries_ceiling: OPTIMIZER_ENTRIES_COUNT_CEILING,
            min_requests: OPTIMIZER_REQUESTS_COUNT_MIN,
        }
    }
}

impl OptimizerSettings {
    /// Set the TTL bounds.
    #[must_use]
    pub fn with_ttl_bounds_ms(mut self, floor_ms: u64, ceiling_ms: u64) -> Self {
        self.ttl_floor_ms = floor_ms;
        self.ttl_ceiling_ms = ceiling_ms;
        self
    }

    /// Set the hit-rate band.
    #[must_use]
    pub fn with_hit_rate_band(mut self, low: f64, high: f64) -> Self {
        self.hit_rate_low = low;
        self.hit_rate_high = high;
        self
    }

    /// Set the capacity ceiling.
    #[must_use]
    pub fn with_entries_ceiling(mut self, ceiling: usize) -> Self {
        self.entries_ceiling = ceiling;
        self
    }

    /// Set the minimum observed requests before a strategy is tuned.
    #[must_use]
    pub fn with_min_requests(mut self, min_requests: u64) -> Self {
        self.min_requests = min_requests;
        self
    }

    /// Check that thresholds are consistent.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the first bad threshold.
    pub fn validate(&self) -> CacheResult<()> {
        let unit = 0.0..=1.0;
        let step = |ratio: f64| ratio > 0.0 && ratio < 1.0;

        if self.ttl_floor_ms == 0 || self.ttl_floor_ms > self.ttl_ceiling_ms {
            return Err(CacheError::invalid_config(format!(
                "optimizer ttl bounds {}..={} are invalid",
                self.ttl_floor_ms, self.ttl_ceiling_ms
            )));
        }
        if !unit.contains(&self.hit_rate_low)
            || !unit.contains(&self.hit_rate_high)
            || self.hit_rate_low > self.hit_rate_high
        {
            return Err(CacheError::invalid_config(format!(
                "optimizer hit-rate band {}..{} is invalid",
                self.hit_rate_low, self.hit_rate_high
            )));
        }
        if !unit.contains(&self.eviction_rate_max) {
            return Err(CacheError::invalid_config("optimizer eviction_rate_max must be in [0, 1]"));
        }
        if !step(self.ttl_step_ratio) || !step(self.capacity_step_ratio) {
            return Err(CacheError::invalid_config("optimizer step ratios must be in (0, 1)"));
        }
        if self.entries_ceiling == 0 {
            return Err(CacheError::invalid_config("optimizer entries_ceiling must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// CacheCoordinatorConfig
// =============================================================================

/// Configuration for a `CacheCoordinator`.
///
/// `TigerStyle`:
/// - Sensible defaults via Default impl
/// - Builder pattern for customization
/// - All fields public for transparency
///
/// # Example
///
/// ```rust
/// use haven_cache::cache::{CacheStrategy, EvictionPolicy};
/// use haven_cache::config::CacheCoordinatorConfig;
///
/// let config = CacheCoordinatorConfig::empty()
///     .with_strategy(CacheStrategy::new("api_responses").with_eviction_policy(EvictionPolicy::Fifo))
///     .without_auto_optimization();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCoordinatorConfig {
    /// Strategies registered at construction
    pub strategies: Vec<CacheStrategy>,

    /// Memory budget across all strategies, reported but not enforced.
    ///
    /// Default: 50MB
    pub global_max_memory_bytes: usize,

    /// Persisted envelopes at least this large are compressed when the
    /// strategy enables compression.
    ///
    /// Default: 1KB
    pub compression_threshold_bytes: usize,

    /// Whether `spawn_auto_optimizer` starts a background loop.
    ///
    /// Default: true
    pub auto_optimization_enabled: bool,

    /// Interval between background optimizer passes (ms).
    ///
    /// Default: 5 minutes
    pub optimization_interval_ms: u64,

    /// Optimizer thresholds
    pub optimizer: OptimizerSettings,
}

impl Default for CacheCoordinatorConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            global_max_memory_bytes: CACHE_GLOBAL_MEMORY_BYTES_DEFAULT,
            compression_threshold_bytes: CACHE_COMPRESSION_THRESHOLD_BYTES_DEFAULT,
            auto_optimization_enabled: true,
            optimization_interval_ms: OPTIMIZER_INTERVAL_MS_DEFAULT,
            optimizer: OptimizerSettings::default(),
        }
    }
}

/// The five strategies of the mental-health platform.
#[must_use]
pub fn default_strategies() -> Vec<CacheStrategy> {
    vec![
        CacheStrategy::new("user_data")
            .with_max_entries(1000)
            .with_ttl_ms(30 * TIME_MS_PER_MIN)
            .with_eviction_policy(EvictionPolicy::Lru)
            .with_persistence(true),
        CacheStrategy::new("session_tokens")
            .with_max_entries(100)
            .with_ttl_ms(15 * TIME_MS_PER_MIN)
            .with_eviction_policy(EvictionPolicy::Ttl),
        CacheStrategy::new("static_resources")
            .with_max_entries(500)
            .with_ttl_ms(TIME_MS_PER_DAY)
            .with_eviction_policy(EvictionPolicy::Lfu)
            .with_compression(true)
            .with_persistence(true),
        CacheStrategy::new("api_responses")
            .with_max_entries(200)
            .with_ttl_ms(5 * TIME_MS_PER_MIN)
            .with_eviction_policy(EvictionPolicy::Fifo),
        CacheStrategy::new("crisis_resources")
            .with_max_entries(50)
            .with_ttl_ms(TIME_MS_PER_DAY)
            .with_eviction_policy(EvictionPolicy::Priority)
            .with_persistence(true),
    ]
}

impl CacheCoordinatorConfig {
    /// Create a config with default values and the default strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with default knobs and no strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config.
    ///
    /// Missing fields take their defaults; a missing `strategies` list means
    /// the default strategies.
    ///
    /// # Errors
    /// Returns `InvalidConfig` on malformed JSON, or any validation error.
    pub fn from_json_str(json: &str) -> CacheResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CacheError::invalid_config(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Add a strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Set the global memory budget.
    #[must_use]
    pub fn with_global_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.global_max_memory_bytes = bytes;
        self
    }

    /// Set the compression threshold.
    #[must_use]
    pub fn with_compression_threshold_bytes(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    /// Set the background optimizer interval.
    #[must_use]
    pub fn with_optimization_interval_ms(mut self, interval_ms: u64) -> Self {
        self.optimization_interval_ms = interval_ms;
        self
    }

    /// Set optimizer thresholds.
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerSettings) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Disable the background optimizer.
    #[must_use]
    pub fn without_auto_optimization(mut self) -> Self {
        self.auto_optimization_enabled = false;
        self
    }

    /// Check every strategy and global knob.
    ///
    /// # Errors
    /// Returns `InvalidStrategy` for a bad strategy, or `InvalidConfig` for
    /// duplicate names and out-of-range knobs.
    pub fn validate(&self) -> CacheResult<()> {
        let mut seen = HashSet::new();
        for strategy in &self.strategies {
            strategy.validate()?;
            if !seen.insert(strategy.name.as_str()) {
                return Err(CacheError::invalid_config(format!(
                    "duplicate strategy name: {}",
                    strategy.name
                )));
            }
        }

        if self.global_max_memory_bytes == 0 {
            return Err(CacheError::invalid_config("global_max_memory_bytes must be positive"));
        }
        if self.compression_threshold_bytes > CODEC_ENVELOPE_BYTES_MAX {
            return Err(CacheError::invalid_config(format!(
                "compression_threshold_bytes exceeds {CODEC_ENVELOPE_BYTES_MAX}"
            )));
        }
        if self.optimization_interval_ms == 0 {
            return Err(CacheError::invalid_config("optimization_interval_ms must be positive"));
        }
        self.optimizer.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CacheCoordinatorConfig::default();

        assert_eq!(config.strategies.len(), 5);
        assert_eq!(config.global_max_memory_bytes, 50 * 1024 * 1024);
        assert_eq!(config.compression_threshold_bytes, 1024);
        assert!(config.auto_optimization_enabled);
        assert!(config.validate().is_ok());

        let crisis = config
            .strategies
            .iter()
            .find(|s| s.name == "crisis_resources")
            .unwrap();
        assert_eq!(crisis.eviction_policy, EvictionPolicy::Priority);
        assert_eq!(crisis.max_entries, 50);
        assert!(crisis.persist_to_durable_store);
    }

    #[test]
    fn test_builder_pattern() {
        let config = CacheCoordinatorConfig::empty()
            .with_strategy(CacheStrategy::new("a"))
            .with_global_max_memory_bytes(1024)
            .with_compression_threshold_bytes(64)
            .with_optimization_interval_ms(10)
            .without_auto_optimization();

        assert_eq!(config.strategies.len(), 1);
        assert_eq!(config.global_max_memory_bytes, 1024);
        assert_eq!(config.compression_threshold_bytes, 64);
        assert_eq!(config.optimization_interval_ms, 10);
        assert!(!config.auto_optimization_enabled);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = CacheCoordinatorConfig::empty()
            .with_strategy(CacheStrategy::new("a"))
            .with_strategy(CacheStrategy::new("a"));

        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig { .. })));
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let config =
            CacheCoordinatorConfig::empty().with_strategy(CacheStrategy::new("a").with_ttl_ms(0));

        assert!(matches!(config.validate(), Err(CacheError::InvalidStrategy { .. })));
    }

    #[test]
    fn test_optimizer_settings_validation() {
        assert!(OptimizerSettings::default().validate().is_ok());
        assert!(OptimizerSettings::default()
            .with_ttl_bounds_ms(10, 5)
            .validate()
            .is_err());
        assert!(OptimizerSettings::default()
            .with_hit_rate_band(0.9, 0.1)
            .validate()
            .is_err());
        assert!(OptimizerSettings::default()
            .with_entries_ceiling(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_json_defaults_and_errors() {
        let config = CacheCoordinatorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CacheCoordinatorConfig::default());

        let err = CacheCoordinatorConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig { .. }));

        let err = CacheCoordinatorConfig::from_json_str(r#"{"optimization_interval_ms": 0}"#)
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig { .. }));
    }

    #[test]
    fn test_json_round_trip_keeps_policy_names() {
        let json = serde_json::to_string(&CacheCoordinatorConfig::default()).unwrap();
        assert!(json.contains(r#""eviction_policy":"PRIORITY""#));

        let parsed = CacheCoordinatorConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, CacheCoordinatorConfig::default());
    }
}
