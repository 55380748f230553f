//! Cache - Strategy Stores, Eviction and Coordination
//!
//! `TigerStyle`: Bounded stores, deterministic eviction, explicit errors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CacheCoordinator<T>                    │
//! │   set / get / invalidate / clear / preload / metrics    │
//! └─────────────────────────────────────────────────────────┘
//!        │ one Mutex per strategy              ↑ reads metrics,
//!        ↓                                     │ swaps configs
//! ┌───────────────────────┐         ┌──────────┴──────────┐
//! │   StrategyStore<T>    │────────→│    AutoOptimizer    │
//! │  entries + metrics    │         └─────────────────────┘
//! └───────────────────────┘
//!        │ at capacity
//!        ↓
//! ┌───────────────────────┐
//! │    EvictionPolicy     │  LRU | LFU | FIFO | TTL | PRIORITY
//! └───────────────────────┘
//! ```

mod coordinator;
mod entry;
mod eviction;
mod metrics;
mod optimizer;
mod preload;
mod store;
mod strategy;

pub use coordinator::{CacheCoordinator, CacheCoordinatorBuilder, CacheValue};
pub use entry::{CacheEntry, Priority};
pub use eviction::EvictionPolicy;
pub use metrics::{CachePerformanceMetrics, MetricsRecorder};
pub use optimizer::{spawn_auto_optimizer, AutoOptimizer, OptimizationChange};
pub use preload::{PreloadCancel, PreloadSummary};
pub use store::{Lookup, SetOutcome, StrategyStore};
pub use strategy::CacheStrategy;
