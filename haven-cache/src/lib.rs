//! # Haven Cache
//!
//! A cache strategy coordinator: named caches, each with its own capacity,
//! TTL, eviction policy and persistence flag, behind one async API.
//!
//! ## Features
//!
//! - **Named strategies**: `user_data`, `session_tokens`, `static_resources`,
//!   `api_responses` and `crisis_resources` out of the box, more at runtime
//! - **Five eviction policies**: LRU, LFU, FIFO, TTL and PRIORITY
//! - **Durable write-through**: persistent strategies survive restarts via a
//!   pluggable [`DurableStore`](persistence::DurableStore), with optional LZ4
//! - **Metrics and auto-tuning**: per-strategy hit/miss/eviction counters feed
//!   an optimizer that adjusts TTL and capacity
//! - **Deterministic testing**: simulated clock, seeded RNG and fault injection
//!
//! ## Quick Start
//!
//! ```rust
//! use haven_cache::{CacheCoordinator, Priority};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let cache: CacheCoordinator<String> = CacheCoordinator::builder().build()?;
//!
//! cache.set("user_data", "u1", "Alex".to_string()).await?;
//! cache
//!     .set_with_priority("crisis_resources", "hotline", "988".to_string(), Priority::High)
//!     .await?;
//!
//! assert_eq!(cache.get("user_data", "u1").await?, Some("Alex".to_string()));
//! assert_eq!(cache.metrics("user_data")?.hits, 1);
//! # Ok::<(), haven_cache::CacheError>(())
//! # }).unwrap();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CacheCoordinator<T>                    │
//! ├─────────────────────────────────────────────────────────┤
//! │  StrategyStore per name  │ entries, eviction, metrics   │
//! │  AutoOptimizer           │ TTL / capacity feedback      │
//! │  Preload                 │ warm from an async provider  │
//! ├─────────────────────────────────────────────────────────┤
//! │  DurableStore            │ "{strategy}:{key}" envelopes │
//! ├─────────────────────────────────────────────────────────┤
//! │  DST Framework           │ SimClock + fault injection   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Simulation-First Philosophy
//!
//! > "If you're not testing with fault injection, you're not testing."
//!
//! TTL expiry is driven by an injectable [`Clock`](clock::Clock), so tests
//! advance a [`SimClock`] instead of sleeping. See [`dst`] for the harness.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod dst;
pub mod error;
pub mod persistence;
pub mod telemetry;

// Re-export common types
pub use cache::{
    spawn_auto_optimizer, AutoOptimizer, CacheCoordinator, CacheCoordinatorBuilder, CacheEntry,
    CachePerformanceMetrics, CacheStrategy, CacheValue, EvictionPolicy, OptimizationChange,
    PreloadCancel, PreloadSummary, Priority,
};
pub use clock::{Clock, SystemClock};
pub use config::{default_strategies, CacheCoordinatorConfig, OptimizerSettings};
pub use dst::{
    create_simulation, run_property_tests, DeterministicRng, FaultConfig, FaultInjector,
    FaultType, PropertyTest, PropertyTestable, SimClock, SimConfig, SimEnvironment, Simulation,
    TimeAdvanceConfig,
};
pub use error::{CacheError, CacheResult};
pub use persistence::{DurableStore, PersistenceError, PersistenceResult, SimDurableStore};
pub use telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
