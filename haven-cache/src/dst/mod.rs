//! DST - Deterministic Simulation Testing
//!
//! TigerBeetle/FoundationDB-style deterministic simulation testing for the
//! cache coordinator.
//!
//! # Philosophy
//!
//! > "If you're not testing with fault injection, you're not testing."
//!
//! # Usage
//!
//! ```rust
//! use haven_cache::config::CacheCoordinatorConfig;
//! use haven_cache::dst::{FaultConfig, FaultType, SimConfig, Simulation};
//! use haven_cache::CacheError;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let sim = Simulation::new(SimConfig::with_seed(42))
//!     .with_fault(FaultConfig::new(FaultType::DurableReadFail, 0.1));
//!
//! sim.run(|env| async move {
//!     let cache = env.coordinator::<String>(CacheCoordinatorConfig::new())?;
//!     cache.set("session_tokens", "t1", "abc".to_string()).await?;
//!     env.advance_time_ms(16 * 60 * 1000);
//!     assert_eq!(cache.get("session_tokens", "t1").await?, None);
//!     Ok::<(), CacheError>(())
//! })
//! .await
//! .unwrap();
//! # });
//! ```
//!
//! Run with explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

mod clock;
mod config;
mod fault;
mod property;
mod rng;
mod simulation;

pub use clock::SimClock;
pub use config::SimConfig;
pub use fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
pub use property::{
    run_property_tests, PropertyTest, PropertyTestFailure, PropertyTestResult, PropertyTestable,
    TimeAdvanceConfig,
};
pub use rng::DeterministicRng;
pub use simulation::{create_simulation, SimEnvironment, Simulation};
