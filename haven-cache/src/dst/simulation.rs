//! Simulation - DST Test Harness
//!
//! `TigerStyle`: Simulation harness that provides a deterministic environment
//! for the cache coordinator: simulated time, a seeded RNG and a durable store
//! sharing one fault injector.

use std::future::Future;
use std::sync::Arc;

use super::clock::SimClock;
use super::config::SimConfig;
use super::fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
use super::rng::DeterministicRng;
use crate::cache::{CacheCoordinator, CacheValue};
use crate::config::CacheCoordinatorConfig;
use crate::error::CacheResult;
use crate::persistence::SimDurableStore;

/// Environment provided to simulation tests.
///
/// `TigerStyle`: All simulation resources in one place.
#[derive(Debug)]
pub struct SimEnvironment {
    /// Simulation configuration
    pub config: SimConfig,
    /// Simulated clock
    pub clock: SimClock,
    /// Deterministic RNG
    pub rng: DeterministicRng,
    /// Fault injector (shared via Arc with the durable store)
    pub faults: Arc<FaultInjector>,
    /// Simulated durable store
    pub durable: SimDurableStore,
}

impl SimEnvironment {
    fn from_parts(config: SimConfig, fault_configs: Vec<FaultConfig>) -> Self {
        let mut rng = DeterministicRng::new(config.seed());
        let clock = SimClock::at_ms(config.start_ms());

        let mut fault_builder = FaultInjectorBuilder::new(rng.fork());
        for fault_config in fault_configs {
            fault_builder = fault_builder.with_fault(fault_config);
        }
        let faults = Arc::new(fault_builder.build());

        // The store shares the injector so registered faults reach it.
        let durable = SimDurableStore::with_fault_injector(Arc::clone(&faults));

        Self {
            config,
            clock,
            rng,
            faults,
            durable,
        }
    }

    /// Advance simulated time in milliseconds.
    pub fn advance_time_ms(&self, ms: u64) -> u64 {
        self.clock.advance_ms(ms)
    }

    /// Advance simulated time in seconds.
    pub fn advance_time_secs(&self, secs: f64) -> u64 {
        self.clock.advance_secs(secs)
    }

    /// Get current simulated time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Build a coordinator wired to this environment's clock and durable store.
    ///
    /// Every coordinator built from the same environment shares one durable
    /// store, which is how restart and rehydration are simulated.
    ///
    /// # Errors
    /// Returns the coordinator's configuration validation error.
    pub fn coordinator<T: CacheValue>(
        &self,
        config: CacheCoordinatorConfig,
    ) -> CacheResult<CacheCoordinator<T>> {
        CacheCoordinator::builder()
            .with_config(config)
            .with_clock(Arc::new(self.clock.clone()))
            .with_durable_store(Arc::new(self.durable.clone()))
            .build()
    }

    /// Roll for a data provider fault before a simulated fetch.
    ///
    /// Preload tests call this from their fetch closure to make the provider
    /// fail under the registered `ProviderFetchFail`/`ProviderTimeout` faults.
    #[must_use]
    pub fn provider_fault(&self) -> Option<FaultType> {
        self.faults.should_inject("provider_fetch")
    }
}

/// DST simulation harness.
///
/// `TigerStyle`:
/// - Single seed controls all randomness
/// - Faults are registered explicitly
/// - Environment is provided to test closure
///
/// # Example
///
/// ```rust
/// use haven_cache::config::CacheCoordinatorConfig;
/// use haven_cache::dst::{FaultConfig, FaultType, SimConfig, Simulation};
/// use haven_cache::CacheError;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let sim = Simulation::new(SimConfig::with_seed(42))
///     .with_fault(FaultConfig::new(FaultType::DurableWriteFail, 1.0));
///
/// sim.run(|env| async move {
///     let cache = env.coordinator::<String>(CacheCoordinatorConfig::new())?;
///     // The durable write fails; the in-memory copy is still served.
///     cache.set("user_data", "u1", "Alex".to_string()).await?;
///     assert_eq!(cache.get("user_data", "u1").await?, Some("Alex".to_string()));
///     Ok::<(), CacheError>(())
/// })
/// .await
/// .unwrap();
/// # });
/// ```
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    fault_configs: Vec<FaultConfig>,
}

impl Simulation {
    /// Create a new simulation with the given configuration.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            fault_configs: Vec::new(),
        }
    }

    /// Register a fault to inject during simulation.
    ///
    /// `TigerStyle`: Fluent API for fault registration.
    #[must_use]
    pub fn with_fault(mut self, fault_config: FaultConfig) -> Self {
        self.fault_configs.push(fault_config);
        self
    }

    /// Add durable store write and read faults.
    #[must_use]
    pub fn with_durable_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::DurableWriteFail, probability))
            .with_fault(FaultConfig::new(FaultType::DurableReadFail, probability))
    }

    /// Add data provider fetch faults.
    #[must_use]
    pub fn with_provider_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::ProviderFetchFail, probability))
    }

    /// Run the simulation with the given test function.
    ///
    /// `TigerStyle`: Test function receives environment and returns Result.
    ///
    /// # Errors
    /// Returns any error from the test function.
    pub async fn run<F, Fut, E>(self, test_fn: F) -> Result<(), E>
    where
        F: FnOnce(SimEnvironment) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let seed = self.config.seed();
        let env = self.build();
        let faults = Arc::clone(&env.faults);

        let result = test_fn(env).await;

        let injected = faults.total_injections();
        if injected > 0 {
            tracing::debug!(seed, injected, "simulation finished with injected faults");
        }
        result
    }

    /// Build the simulation environment without running a test.
    ///
    /// Useful for custom test setups.
    #[must_use]
    pub fn build(self) -> SimEnvironment {
        SimEnvironment::from_parts(self.config, self.fault_configs)
    }
}

/// Create a simulation with optional seed.
///
/// `TigerStyle`: Factory function for common case.
#[must_use]
pub fn create_simulation(seed: Option<u64>) -> Simulation {
    let config = match seed {
        Some(s) => SimConfig::with_seed(s),
        None => SimConfig::from_env_or_random(),
    };
    Simulation::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStrategy;
    use crate::error::CacheError;

    fn config() -> CacheCoordinatorConfig {
        CacheCoordinatorConfig::empty().with_strategy(
            CacheStrategy::new("user_data")
                .with_max_entries(10)
                .with_ttl_ms(1000)
                .with_persistence(true),
        )
    }

    #[tokio::test]
    async fn test_basic_simulation() {
        let sim = Simulation::new(SimConfig::with_seed(42));

        sim.run(|env| async move {
            let cache = env.coordinator::<String>(config())?;
            cache.set("user_data", "k", "v".to_string()).await?;
            env.advance_time_ms(500);
            assert_eq!(cache.get("user_data", "k").await?, Some("v".to_string()));
            assert_eq!(env.now_ms(), 500);
            Ok::<(), CacheError>(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_simulated_time_drives_expiry() {
        let env = Simulation::new(SimConfig::with_seed(7)).build();
        let cache = env.coordinator::<String>(config()).unwrap();

        cache.set("user_data", "k", "v".to_string()).await.unwrap();
        env.advance_time_ms(1001);
        assert_eq!(cache.get("user_data", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_coordinators_share_durable_store() {
        let env = Simulation::new(SimConfig::with_seed(42)).build();

        let first = env.coordinator::<String>(config()).unwrap();
        first.set("user_data", "k", "v".to_string()).await.unwrap();
        assert_eq!(env.durable.len(), 1);

        let second = env.coordinator::<String>(config()).unwrap();
        assert_eq!(second.get("user_data", "k").await.unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_simulation_determinism() {
        let mut env1 = Simulation::new(SimConfig::with_seed(12345)).build();
        let mut env2 = Simulation::new(SimConfig::with_seed(12345)).build();

        for _ in 0..10 {
            assert_eq!(env1.rng.next_u64(), env2.rng.next_u64());
        }
    }

    #[tokio::test]
    async fn test_start_ms_sets_entry_timestamps() {
        let env = Simulation::new(SimConfig::with_seed(1).with_start_ms(1_000_000)).build();
        assert_eq!(env.now_ms(), 1_000_000);

        let cache = env.coordinator::<String>(config()).unwrap();
        cache.set("user_data", "k", "v".to_string()).await.unwrap();
        env.advance_time_ms(1000);
        assert!(cache.get("user_data", "k").await.unwrap().is_some());
        env.advance_time_ms(1);
        assert!(cache.get("user_data", "k").await.unwrap().is_none());
    }

    #[test]
    fn test_create_simulation() {
        let env = create_simulation(Some(42)).build();
        assert_eq!(env.config.seed(), 42);
    }

    #[tokio::test]
    async fn test_fault_injector_is_shared_with_durable_store() {
        let env = Simulation::new(SimConfig::with_seed(42))
            .with_fault(FaultConfig::new(FaultType::DurableWriteFail, 1.0))
            .build();
        let cache = env.coordinator::<String>(config()).unwrap();

        cache.set("user_data", "k", "v".to_string()).await.unwrap();

        assert!(env.durable.is_empty());
        assert_eq!(env.faults.total_injections(), 1);
        assert_eq!(cache.get("user_data", "k").await.unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_provider_faults() {
        let env = Simulation::new(SimConfig::with_seed(42))
            .with_provider_faults(1.0)
            .build();
        assert_eq!(env.provider_fault(), Some(FaultType::ProviderFetchFail));

        let env = Simulation::new(SimConfig::with_seed(42))
            .with_durable_faults(1.0)
            .build();
        assert_eq!(env.provider_fault(), None);
    }
}
