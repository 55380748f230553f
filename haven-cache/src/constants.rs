//! TigerStyle Constants
//!
//! All limits use big-endian naming: CATEGORY_SPECIFICS_UNIT_LIMIT
//! Example: CACHE_KEY_BYTES_MAX (not MAX_CACHE_KEY_BYTES)
//!
//! Every constant includes units in the name:
//! - _BYTES_MAX/DEFAULT for size limits
//! - _MS_* for milliseconds
//! - _COUNT_MAX/DEFAULT for quantity limits
//! - _RATIO for fractions in [0, 1]

// =============================================================================
// Strategy Limits
// =============================================================================

/// Maximum length of a strategy name
pub const CACHE_STRATEGY_NAME_BYTES_MAX: usize = 64;

/// Maximum length of a cache key
pub const CACHE_KEY_BYTES_MAX: usize = 1024;

/// Absolute upper bound on entries in a single strategy
pub const CACHE_ENTRIES_COUNT_MAX: usize = 1_000_000;

/// Default entry bound for a new strategy
pub const CACHE_ENTRIES_COUNT_DEFAULT: usize = 1000;

/// Default time-to-live for a new strategy
pub const CACHE_TTL_MS_DEFAULT: u64 = 30 * TIME_MS_PER_MIN;

/// Maximum time-to-live for any strategy
pub const CACHE_TTL_MS_MAX: u64 = 7 * TIME_MS_PER_DAY;

// =============================================================================
// Coordinator Limits
// =============================================================================

/// Default memory budget across all strategies
pub const CACHE_GLOBAL_MEMORY_BYTES_DEFAULT: usize = 50 * 1024 * 1024; // 50MB

/// Default size at which persisted envelopes get LZ4 compressed
pub const CACHE_COMPRESSION_THRESHOLD_BYTES_DEFAULT: usize = 1024; // 1KB

/// Maximum number of keys in a single preload batch
pub const PRELOAD_KEYS_COUNT_MAX: usize = 10_000;

/// Separator between strategy name and key in durable store keys
pub const DURABLE_KEY_SEPARATOR: char = ':';

// =============================================================================
// Auto-Optimizer
// =============================================================================

/// TTL is never shrunk below this floor
pub const OPTIMIZER_TTL_MS_FLOOR: u64 = TIME_MS_PER_MIN;

/// TTL is never grown above this ceiling
pub const OPTIMIZER_TTL_MS_CEILING: u64 = TIME_MS_PER_HOUR;

/// Hit rate below which TTL shrinks
pub const OPTIMIZER_HIT_RATE_LOW_RATIO: f64 = 0.5;

/// Hit rate above which TTL grows
pub const OPTIMIZER_HIT_RATE_HIGH_RATIO: f64 = 0.8;

/// Fraction by which TTL is shrunk or grown per pass
pub const OPTIMIZER_TTL_STEP_RATIO: f64 = 0.2;

/// Eviction rate above which capacity grows
pub const OPTIMIZER_EVICTION_RATE_MAX_RATIO: f64 = 0.1;

/// Fraction by which capacity grows per pass
pub const OPTIMIZER_CAPACITY_STEP_RATIO: f64 = 0.1;

/// Capacity is never grown above this ceiling
pub const OPTIMIZER_ENTRIES_COUNT_CEILING: usize = 10_000;

/// Strategies with fewer requests than this are left alone
pub const OPTIMIZER_REQUESTS_COUNT_MIN: u64 = 1;

/// Default interval between optimizer passes
pub const OPTIMIZER_INTERVAL_MS_DEFAULT: u64 = 5 * TIME_MS_PER_MIN;

// =============================================================================
// Persistence Codec
// =============================================================================

/// Tag byte for an uncompressed envelope
pub const CODEC_TAG_PLAIN: u8 = 0;

/// Tag byte for an LZ4-compressed envelope
pub const CODEC_TAG_LZ4: u8 = 1;

/// Maximum size of a persisted envelope
pub const CODEC_ENVELOPE_BYTES_MAX: usize = 16 * 1024 * 1024; // 16MB

// =============================================================================
// Telemetry
// =============================================================================

/// Default log filter when RUST_LOG is unset
pub const TELEMETRY_FILTER_DEFAULT: &str = "haven_cache=info";

// =============================================================================
// DST (Deterministic Simulation Testing) Limits
// =============================================================================

/// Maximum number of simulation steps
pub const DST_SIMULATION_STEPS_MAX: u64 = 1_000_000;

/// Maximum probability for fault injection (1.0 = 100%)
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

/// Maximum time advance per step in milliseconds
pub const DST_TIME_ADVANCE_MS_MAX: u64 = 86_400_000; // 24 hours

/// Maximum value size accepted by the simulated durable store
pub const DST_DURABLE_VALUE_BYTES_MAX: usize = 10_000_000;

// =============================================================================
// Time Constants
// =============================================================================

/// Milliseconds per second
pub const TIME_MS_PER_SEC: u64 = 1000;

/// Milliseconds per minute
pub const TIME_MS_PER_MIN: u64 = 60 * TIME_MS_PER_SEC;

/// Milliseconds per hour
pub const TIME_MS_PER_HOUR: u64 = 60 * TIME_MS_PER_MIN;

/// Milliseconds per day
pub const TIME_MS_PER_DAY: u64 = 24 * TIME_MS_PER_HOUR;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_limits_valid() {
        assert!(CACHE_ENTRIES_COUNT_DEFAULT <= CACHE_ENTRIES_COUNT_MAX);
        assert!(CACHE_TTL_MS_DEFAULT < CACHE_TTL_MS_MAX);
    }

    #[test]
    fn test_optimizer_bounds_valid() {
        assert!(OPTIMIZER_TTL_MS_FLOOR < OPTIMIZER_TTL_MS_CEILING);
        assert!(OPTIMIZER_HIT_RATE_LOW_RATIO < OPTIMIZER_HIT_RATE_HIGH_RATIO);
        assert!(OPTIMIZER_ENTRIES_COUNT_CEILING <= CACHE_ENTRIES_COUNT_MAX);
    }

    #[test]
    fn test_codec_tags_distinct() {
        assert_ne!(CODEC_TAG_PLAIN, CODEC_TAG_LZ4);
    }

    #[test]
    fn test_time_constants_consistent() {
        assert_eq!(TIME_MS_PER_MIN, 60_000);
        assert_eq!(TIME_MS_PER_HOUR, 3_600_000);
        assert_eq!(TIME_MS_PER_DAY, 86_400_000);
    }
}
