//! FaultInjector - Probabilistic Fault Injection
//!
//! `TigerStyle`: Explicit fault injection for chaos testing of the durable
//! store and preload data providers.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Types of faults that can be injected.
///
/// TigerStyle: Every fault type is explicit and documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    // =========================================================================
    // Durable Store Faults
    // =========================================================================
    /// `put` fails
    DurableWriteFail,
    /// `get` fails
    DurableReadFail,
    /// `remove` fails
    DurableRemoveFail,
    /// `get` returns garbled bytes
    DurableCorruption,

    // =========================================================================
    // Data Provider Faults
    // =========================================================================
    /// Preload fetch fails
    ProviderFetchFail,
    /// Preload fetch returns after the caller's deadline
    ProviderTimeout,
}

impl FaultType {
    /// Get the fault type name as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DurableWriteFail => "durable_write_fail",
            Self::DurableReadFail => "durable_read_fail",
            Self::DurableRemoveFail => "durable_remove_fail",
            Self::DurableCorruption => "durable_corruption",
            Self::ProviderFetchFail => "provider_fetch_fail",
            Self::ProviderTimeout => "provider_timeout",
        }
    }

    /// Operation name this fault applies to unless a filter overrides it.
    #[must_use]
    pub fn default_operation(&self) -> &'static str {
        match self {
            Self::DurableWriteFail => "durable_put",
            Self::DurableReadFail | Self::DurableCorruption => "durable_get",
            Self::DurableRemoveFail => "durable_remove",
            Self::ProviderFetchFail | Self::ProviderTimeout => "provider_fetch",
        }
    }
}

/// Configuration for a specific fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The type of fault
    pub fault_type: FaultType,
    /// Probability of injection (0.0 to 1.0)
    pub probability: f64,
    /// Optional operation filter (substring match)
    pub operation_filter: Option<String>,
    /// Maximum number of injections (None = unlimited)
    pub max_injections: Option<u64>,
}

impl FaultConfig {
    /// Create a new fault configuration.
    ///
    /// The fault only fires for its default operation (see
    /// [`FaultType::default_operation`]) unless a filter is set.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        // Precondition
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {DST_FAULT_PROBABILITY_MAX}], got {probability}"
        );

        Self {
            fault_type,
            probability,
            operation_filter: None,
            max_injections: None,
        }
    }

    /// Set operation filter (fault only applies to matching operations).
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.operation_filter = Some(filter.into());
        self
    }

    /// Set maximum number of injections.
    ///
    /// # Panics
    /// Panics if max is zero.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        // Precondition
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }

    fn matches(&self, operation: &str) -> bool {
        match &self.operation_filter {
            Some(filter) => operation.contains(filter.as_str()),
            None => operation.contains(self.fault_type.default_operation()),
        }
    }
}

/// Fault injector for simulation testing.
///
/// TigerStyle:
/// - Explicit fault registration
/// - Deterministic through RNG
/// - Statistics tracked
/// - Interior mutability for sharing via Arc
#[derive(Debug)]
pub struct FaultInjector {
    rng: Mutex<DeterministicRng>,
    configs: Vec<FaultConfig>,
    injection_counts: Mutex<HashMap<FaultType, u64>>,
}

impl FaultInjector {
    /// Create a new fault injector with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            configs: Vec::new(),
            injection_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Register a fault configuration.
    ///
    /// Note: Registration must happen before sharing via Arc.
    pub fn register(&mut self, config: FaultConfig) {
        self.injection_counts
            .get_mut()
            .entry(config.fault_type)
            .or_insert(0);
        self.configs.push(config);
    }

    /// Check if a fault should be injected for the given operation.
    ///
    /// Returns the fault type if one should be injected, None otherwise.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        for config in &self.configs {
            if !config.matches(operation) {
                continue;
            }

            if let Some(max) = config.max_injections {
                let count = self
                    .injection_counts
                    .lock()
                    .get(&config.fault_type)
                    .copied()
                    .unwrap_or(0);
                if count >= max {
                    continue;
                }
            }

            if self.rng.lock().next_bool(config.probability) {
                *self
                    .injection_counts
                    .lock()
                    .entry(config.fault_type)
                    .or_insert(0) += 1;
                return Some(config.fault_type);
            }
        }

        None
    }

    /// Get injection counts keyed by fault name.
    #[must_use]
    pub fn injection_stats(&self) -> HashMap<String, u64> {
        self.injection_counts
            .lock()
            .iter()
            .map(|(fault_type, count)| (fault_type.as_str().to_string(), *count))
            .collect()
    }

    /// Get total number of injections.
    #[must_use]
    pub fn total_injections(&self) -> u64 {
        self.injection_counts.lock().values().sum()
    }

    /// Reset all statistics.
    pub fn reset_stats(&self) {
        for count in self.injection_counts.lock().values_mut() {
            *count = 0;
        }
    }
}

/// Builder for `FaultInjector`.
///
/// TigerStyle: Builder pattern for clean configuration before sharing via Arc.
pub struct FaultInjectorBuilder {
    rng: DeterministicRng,
    configs: Vec<FaultConfig>,
}

impl FaultInjectorBuilder {
    /// Create a new builder with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng,
            configs: Vec::new(),
        }
    }

    /// Add a fault configuration.
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Add write and read faults on the durable store.
    #[must_use]
    pub fn with_durable_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::DurableWriteFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableReadFail, probability))
    }

    /// Add fetch faults on preload data providers.
    #[must_use]
    pub fn with_provider_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::ProviderFetchFail, probability))
    }

    /// Build the `FaultInjector`.
    #[must_use]
    pub fn build(self) -> FaultInjector {
        let mut injector = FaultInjector::new(self.rng);
        for config in self.configs {
            injector.register(config);
        }
        injector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_no_faults_registered() {
        let injector = FaultInjector::new(DeterministicRng::new(42));

        for _ in 0..100 {
            assert!(injector.should_inject("durable_put").is_none());
        }
    }

    #[test]
    fn test_always_inject_on_default_operation() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::DurableWriteFail, 1.0));

        for _ in 0..10 {
            assert_eq!(
                injector.should_inject("durable_put"),
                Some(FaultType::DurableWriteFail)
            );
        }
        assert!(injector.should_inject("durable_get").is_none());
    }

    #[test]
    fn test_never_inject() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::DurableWriteFail, 0.0));

        for _ in 0..100 {
            assert!(injector.should_inject("durable_put").is_none());
        }
    }

    #[test]
    fn test_operation_filter_overrides_default() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::ProviderFetchFail, 1.0).with_filter("provider_fetch:user:2"),
        );

        assert!(injector.should_inject("provider_fetch:user:1").is_none());
        assert_eq!(
            injector.should_inject("provider_fetch:user:2"),
            Some(FaultType::ProviderFetchFail)
        );
    }

    #[test]
    fn test_max_injections() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::DurableReadFail, 1.0).with_max_injections(2));

        assert!(injector.should_inject("durable_get").is_some());
        assert!(injector.should_inject("durable_get").is_some());
        assert!(injector.should_inject("durable_get").is_none());
    }

    #[test]
    fn test_injection_stats_and_reset() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::DurableWriteFail, 1.0));

        injector.should_inject("durable_put");
        injector.should_inject("durable_put");
        injector.should_inject("durable_put");

        assert_eq!(injector.injection_stats().get("durable_write_fail"), Some(&3));
        assert_eq!(injector.total_injections(), 3);

        injector.reset_stats();
        assert_eq!(injector.total_injections(), 0);
    }

    #[test]
    #[should_panic(expected = "probability must be in")]
    fn test_invalid_probability() {
        let _ = FaultConfig::new(FaultType::DurableWriteFail, 1.5);
    }

    #[test]
    #[should_panic(expected = "max_injections must be positive")]
    fn test_invalid_max_injections() {
        let _ = FaultConfig::new(FaultType::DurableWriteFail, 0.5).with_max_injections(0);
    }

    #[test]
    fn test_builder_and_arc_sharing() {
        let injector = Arc::new(
            FaultInjectorBuilder::new(DeterministicRng::new(42))
                .with_durable_faults(1.0)
                .build(),
        );
        let shared = Arc::clone(&injector);

        assert_eq!(
            shared.should_inject("durable_put"),
            Some(FaultType::DurableWriteFail)
        );
        assert_eq!(
            injector.should_inject("durable_get"),
            Some(FaultType::DurableReadFail)
        );
        assert_eq!(injector.total_injections(), 2);
    }
}
