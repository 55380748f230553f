//! SimConfig - Simulation Configuration
//!
//! `TigerStyle`: Seed and time origin for deterministic cache simulations.

use std::env;

use rand::Rng;

/// Configuration for a simulation run.
///
/// TigerStyle:
/// - Immutable after creation
/// - Seed logged for reproducibility
/// - Time origin explicit, so entry timestamps are reproducible too
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    seed: u64,
    start_ms: u64,
}

impl SimConfig {
    /// Create config with explicit seed. Simulated time starts at zero.
    ///
    /// # Example
    /// ```
    /// use haven_cache::dst::SimConfig;
    /// let config = SimConfig::with_seed(12345);
    /// assert_eq!(config.seed(), 12345);
    /// assert_eq!(config.start_ms(), 0);
    /// ```
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, start_ms: 0 }
    }

    /// Create config from the `DST_SEED` env var or a random seed.
    ///
    /// A generated seed is logged so a failing run can be replayed.
    ///
    /// # Panics
    /// Panics if `DST_SEED` is set but is not a valid u64.
    #[must_use]
    pub fn from_env_or_random() -> Self {
        let seed = match env::var("DST_SEED") {
            Ok(seed_str) => seed_str
                .parse::<u64>()
                .unwrap_or_else(|_| panic!("DST_SEED must be a valid u64, got: {seed_str}")),
            Err(_) => {
                let seed = rand::thread_rng().gen::<u64>();
                tracing::info!(seed, "DST: generated random seed (replay with DST_SEED)");
                seed
            }
        };

        Self::with_seed(seed)
    }

    /// Get the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulated time at the start of the run (ms).
    #[must_use]
    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    /// Start simulated time at `start_ms`, e.g. a realistic epoch timestamp
    /// when persisted envelopes are inspected by hand.
    #[must_use]
    pub fn with_start_ms(self, start_ms: u64) -> Self {
        Self {
            seed: self.seed,
            start_ms,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_env_or_random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_seed() {
        let config = SimConfig::with_seed(12345);
        assert_eq!(config.seed(), 12345);
        assert_eq!(config.start_ms(), 0);
    }

    #[test]
    fn test_with_seed_extremes() {
        assert_eq!(SimConfig::with_seed(0).seed(), 0);
        assert_eq!(SimConfig::with_seed(u64::MAX).seed(), u64::MAX);
    }

    #[test]
    fn test_with_start_ms_keeps_seed() {
        // 2024-01-01T00:00:00Z
        let config = SimConfig::with_seed(42).with_start_ms(1_704_067_200_000);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.start_ms(), 1_704_067_200_000);
    }
}
