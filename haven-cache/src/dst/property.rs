//! Property-Based Testing for DST
//!
//! `TigerStyle`: Random operation sequences with invariant checking.
//!
//! Property tests generate random cache operations, apply them, and verify
//! that invariants (capacity bound, hit/miss accounting) hold after every
//! step. Combined with [`SimClock`] this drives TTL expiry deterministically:
//! a failing seed reproduces the exact same sequence.
//!
//! # Example
//!
//! ```rust,ignore
//! use haven_cache::dst::{DeterministicRng, PropertyTest, PropertyTestable, SimClock};
//!
//! impl PropertyTestable for StoreHarness {
//!     type Operation = StoreOp;
//!     fn generate_operation(&self, rng: &mut DeterministicRng) -> StoreOp { /* ... */ }
//!     fn apply_operation(&mut self, op: &StoreOp, clock: &SimClock) { /* ... */ }
//!     fn check_invariants(&self) -> Result<(), String> { /* ... */ }
//! }
//!
//! PropertyTest::new(42).with_max_operations(1000).run_and_assert(StoreHarness::new());
//! ```

use std::fmt::Debug;

use super::clock::SimClock;
use super::rng::DeterministicRng;
use crate::constants::DST_SIMULATION_STEPS_MAX;

/// Trait for systems that can be property-tested.
///
/// TigerStyle: Explicit operation generation and invariant checking.
pub trait PropertyTestable {
    /// The type of operations that can be performed.
    type Operation: Debug + Clone;

    /// Generate a random operation based on current state.
    fn generate_operation(&self, rng: &mut DeterministicRng) -> Self::Operation;

    /// Apply an operation to the state, reading time from `clock`.
    fn apply_operation(&mut self, op: &Self::Operation, clock: &SimClock);

    /// Check that all invariants hold.
    ///
    /// # Errors
    /// Returns a description of the first violated invariant.
    fn check_invariants(&self) -> Result<(), String>;

    /// Describe the current state for failure reports.
    fn describe_state(&self) -> String {
        String::from("(state description not implemented)")
    }
}

/// Result of a property test run.
#[derive(Debug)]
pub struct PropertyTestResult {
    /// Number of operations executed
    pub operations_executed: u64,
    /// Seed used for reproduction
    pub seed: u64,
    /// Failure details, if any
    pub failure: Option<PropertyTestFailure>,
}

impl PropertyTestResult {
    /// Check if the test passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Panic with reproduction details if the test failed.
    ///
    /// # Panics
    /// Panics if the test failed.
    pub fn unwrap(self) {
        if let Some(failure) = self.failure {
            panic!(
                "Property test failed!\n\
                 Seed: {} (use this to reproduce)\n\
                 Operation #{}: {}\n\
                 Invariant violation: {}\n\
                 State: {}",
                self.seed,
                failure.operation_index,
                failure.operation,
                failure.message,
                failure.state_description
            );
        }
    }
}

/// Details of a property test failure.
#[derive(Debug)]
pub struct PropertyTestFailure {
    /// Index of the failing operation (0-based)
    pub operation_index: u64,
    /// The operation that caused the failure
    pub operation: String,
    /// The invariant violation message
    pub message: String,
    /// Description of the state at failure
    pub state_description: String,
}

/// Configuration for time advancement during property tests.
#[derive(Debug, Clone)]
pub struct TimeAdvanceConfig {
    /// Minimum time to advance per operation (ms)
    pub min_ms: u64,
    /// Maximum time to advance per operation (ms)
    pub max_ms: u64,
    /// Probability of advancing time (0.0 to 1.0)
    pub probability: f64,
}

impl Default for TimeAdvanceConfig {
    fn default() -> Self {
        Self {
            min_ms: 0,
            max_ms: 1000,
            probability: 0.5,
        }
    }
}

impl TimeAdvanceConfig {
    /// No time advancement.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
            probability: 0.0,
        }
    }

    /// Advance with given range and probability.
    ///
    /// # Panics
    /// Panics if the probability is outside [0, 1] or `min_ms > max_ms`.
    #[must_use]
    pub fn random(min_ms: u64, max_ms: u64, probability: f64) -> Self {
        assert!((0.0..=1.0).contains(&probability), "probability must be in [0, 1]");
        assert!(min_ms <= max_ms, "min_ms must be <= max_ms");
        Self {
            min_ms,
            max_ms,
            probability,
        }
    }
}

/// Property-based test runner.
///
/// TigerStyle:
/// - Deterministic via seed
/// - Explicit operation count limits
/// - Invariant checking after each operation
/// - Time advancement control
#[derive(Debug)]
pub struct PropertyTest {
    seed: u64,
    max_operations: u64,
    time_config: TimeAdvanceConfig,
}

impl PropertyTest {
    /// Create a new property test with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_operations: 100,
            time_config: TimeAdvanceConfig::default(),
        }
    }

    /// Set the maximum number of operations to run.
    ///
    /// # Panics
    /// Panics if max exceeds `DST_SIMULATION_STEPS_MAX`.
    #[must_use]
    pub fn with_max_operations(mut self, max: u64) -> Self {
        assert!(
            max <= DST_SIMULATION_STEPS_MAX,
            "max_operations {max} exceeds DST_SIMULATION_STEPS_MAX {DST_SIMULATION_STEPS_MAX}"
        );
        self.max_operations = max;
        self
    }

    /// Configure time advancement between operations.
    #[must_use]
    pub fn with_time_advance(mut self, config: TimeAdvanceConfig) -> Self {
        self.time_config = config;
        self
    }

    /// Run the property test.
    #[must_use]
    pub fn run<T: PropertyTestable>(self, mut state: T) -> PropertyTestResult {
        let mut rng = DeterministicRng::new(self.seed);
        let clock = SimClock::new();

        if let Err(msg) = state.check_invariants() {
            return PropertyTestResult {
                operations_executed: 0,
                seed: self.seed,
                failure: Some(PropertyTestFailure {
                    operation_index: 0,
                    operation: "(initial state)".to_string(),
                    message: format!("Initial state violates invariants: {msg}"),
                    state_description: state.describe_state(),
                }),
            };
        }

        for i in 0..self.max_operations {
            if self.time_config.probability > 0.0 && rng.next_bool(self.time_config.probability) {
                clock.advance_ms(rng.next_ms(self.time_config.min_ms, self.time_config.max_ms));
            }

            let op = state.generate_operation(&mut rng);
            let op_debug = format!("{op:?}");
            state.apply_operation(&op, &clock);

            if let Err(msg) = state.check_invariants() {
                return PropertyTestResult {
                    operations_executed: i + 1,
                    seed: self.seed,
                    failure: Some(PropertyTestFailure {
                        operation_index: i,
                        operation: op_debug,
                        message: msg,
                        state_description: state.describe_state(),
                    }),
                };
            }
        }

        PropertyTestResult {
            operations_executed: self.max_operations,
            seed: self.seed,
            failure: None,
        }
    }

    /// Run the property test, panicking on failure.
    ///
    /// # Panics
    /// Panics if any invariant is violated.
    pub fn run_and_assert<T: PropertyTestable>(self, state: T) {
        self.run(state).unwrap();
    }
}

/// Run the same property over several seeds.
///
/// # Panics
/// Panics if any seed fails.
pub fn run_property_tests<T, F>(seeds: &[u64], max_operations: u64, state_factory: F)
where
    T: PropertyTestable,
    F: Fn() -> T,
{
    for &seed in seeds {
        PropertyTest::new(seed)
            .with_max_operations(max_operations)
            .run_and_assert(state_factory());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Minimal TTL key set: oldest-inserted eviction, expiry read from the clock.
    struct ExpiringKeySet {
        expires_at_ms: HashMap<String, u64>,
        inserted: Vec<String>,
        capacity: usize,
        ttl_ms: u64,
        gets: u64,
        hits: u64,
        misses: u64,
    }

    impl ExpiringKeySet {
        fn new(capacity: usize, ttl_ms: u64) -> Self {
            Self {
                expires_at_ms: HashMap::new(),
                inserted: Vec::new(),
                capacity,
                ttl_ms,
                gets: 0,
                hits: 0,
                misses: 0,
            }
        }
    }

    #[derive(Debug, Clone)]
    enum KeyOp {
        Set(String),
        Get(String),
    }

    impl PropertyTestable for ExpiringKeySet {
        type Operation = KeyOp;

        fn generate_operation(&self, rng: &mut DeterministicRng) -> Self::Operation {
            let key = rng.next_key(8);
            if rng.next_bool(0.5) {
                KeyOp::Set(key)
            } else {
                KeyOp::Get(key)
            }
        }

        fn apply_operation(&mut self, op: &Self::Operation, clock: &SimClock) {
            let now_ms = clock.now_ms();
            match op {
                KeyOp::Set(key) => {
                    if self.expires_at_ms.remove(key).is_some() {
                        self.inserted.retain(|k| k != key);
                    }
                    if self.inserted.len() >= self.capacity {
                        let oldest = self.inserted.remove(0);
                        self.expires_at_ms.remove(&oldest);
                    }
                    self.expires_at_ms.insert(key.clone(), now_ms + self.ttl_ms);
                    self.inserted.push(key.clone());
                }
                KeyOp::Get(key) => {
                    self.gets += 1;
                    match self.expires_at_ms.get(key).copied() {
                        Some(expires_at_ms) if now_ms <= expires_at_ms => self.hits += 1,
                        Some(_) => {
                            self.expires_at_ms.remove(key);
                            self.inserted.retain(|k| k != key);
                            self.misses += 1;
                        }
                        None => self.misses += 1,
                    }
                }
            }
        }

        fn check_invariants(&self) -> Result<(), String> {
            if self.expires_at_ms.len() > self.capacity {
                return Err(format!(
                    "{} entries above capacity {}",
                    self.expires_at_ms.len(),
                    self.capacity
                ));
            }
            if self.hits + self.misses != self.gets {
                return Err(format!(
                    "hits {} + misses {} != gets {}",
                    self.hits, self.misses, self.gets
                ));
            }
            Ok(())
        }

        fn describe_state(&self) -> String {
            format!("entries={:?}", self.inserted)
        }
    }

    /// Key set that never evicts.
    struct UnboundedKeySet {
        keys: Vec<String>,
        capacity: usize,
    }

    impl PropertyTestable for UnboundedKeySet {
        type Operation = KeyOp;

        fn generate_operation(&self, _rng: &mut DeterministicRng) -> Self::Operation {
            KeyOp::Set(format!("k{}", self.keys.len()))
        }

        fn apply_operation(&mut self, op: &Self::Operation, _clock: &SimClock) {
            if let KeyOp::Set(key) = op {
                self.keys.push(key.clone());
            }
        }

        fn check_invariants(&self) -> Result<(), String> {
            if self.keys.len() > self.capacity {
                return Err(format!(
                    "{} entries above capacity {}",
                    self.keys.len(),
                    self.capacity
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn test_expiring_key_set_holds() {
        let result = PropertyTest::new(42)
            .with_max_operations(500)
            .with_time_advance(TimeAdvanceConfig::random(0, 100, 0.5))
            .run(ExpiringKeySet::new(4, 150));
        assert!(result.is_success());
        assert_eq!(result.operations_executed, 500);
    }

    #[test]
    fn test_missing_eviction_reports_failing_operation() {
        let result = PropertyTest::new(7)
            .with_time_advance(TimeAdvanceConfig::none())
            .run(UnboundedKeySet {
                keys: Vec::new(),
                capacity: 2,
            });

        let failure = result.failure.expect("must fail");
        assert_eq!(failure.operation_index, 2);
        assert!(failure.operation.contains("k2"));
        assert!(failure.message.contains("above capacity 2"));
    }

    #[test]
    fn test_run_property_tests_multiple_seeds() {
        run_property_tests(&[0, 1, 42], 200, || ExpiringKeySet::new(3, 50));
    }
}
