//! Auto-Optimizer - Feedback-Driven Strategy Tuning
//!
//! `TigerStyle`: Pure evaluation, bounded steps, copy-on-write application.
//!
//! # Rules
//!
//! Per strategy, given its metrics since the last reset:
//!
//! - hit rate below the low mark: TTL shrinks by the step ratio, never below the floor
//! - hit rate above the high mark: TTL grows by the step ratio, never above the ceiling
//! - eviction rate above the max: capacity grows by the step ratio (at least one
//!   entry), never above the ceiling
//!
//! A TTL already outside the floor/ceiling band is only ever moved toward it.
//! Strategies with too few observed requests are left alone.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::coordinator::{CacheCoordinator, CacheValue};
use super::metrics::CachePerformanceMetrics;
use super::strategy::CacheStrategy;
use crate::config::OptimizerSettings;

// =============================================================================
// OptimizationChange
// =============================================================================

/// One strategy's adjustment from a single optimizer pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationChange {
    /// Strategy name
    pub strategy: String,
    /// TTL before the pass (ms)
    pub old_ttl_ms: u64,
    /// TTL after the pass (ms)
    pub new_ttl_ms: u64,
    /// Capacity before the pass
    pub old_max_entries: usize,
    /// Capacity after the pass
    pub new_max_entries: usize,
    /// Hit rate that drove the decision
    pub hit_rate: f64,
    /// Eviction rate that drove the decision
    pub eviction_rate: f64,
}

impl OptimizationChange {
    /// Whether the TTL moved.
    #[must_use]
    pub fn ttl_changed(&self) -> bool {
        self.old_ttl_ms != self.new_ttl_ms
    }

    /// Whether the capacity moved.
    #[must_use]
    pub fn capacity_changed(&self) -> bool {
        self.old_max_entries != self.new_max_entries
    }
}

// =============================================================================
// AutoOptimizer
// =============================================================================

/// Evaluates strategies against their metrics.
#[derive(Debug, Clone, Default)]
pub struct AutoOptimizer {
    settings: OptimizerSettings,
}

impl AutoOptimizer {
    /// Create an optimizer with the given thresholds.
    #[must_use]
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Thresholds in use.
    #[must_use]
    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Compute the tuned strategy, or `None` when nothing should change.
    ///
    /// # Postconditions
    /// - A shrunk TTL is never below the floor
    /// - A grown TTL is never above the ceiling
    /// - Capacity never decreases
    #[must_use]
    pub fn evaluate(
        &self,
        strategy: &CacheStrategy,
        metrics: &CachePerformanceMetrics,
    ) -> Option<CacheStrategy> {
        let s = &self.settings;
        if metrics.total_requests < s.min_requests.max(1) {
            return None;
        }

        let hit_rate = metrics.hit_rate();
        let eviction_rate = metrics.eviction_rate();

        let mut ttl_ms = strategy.ttl_ms;
        if hit_rate < s.hit_rate_low && ttl_ms > s.ttl_floor_ms {
            ttl_ms = scale(ttl_ms, 1.0 - s.ttl_step_ratio).max(s.ttl_floor_ms);
        } else if hit_rate > s.hit_rate_high && ttl_ms < s.ttl_ceiling_ms {
            ttl_ms = scale(ttl_ms, 1.0 + s.ttl_step_ratio).min(s.ttl_ceiling_ms);
        }

        let mut max_entries = strategy.max_entries;
        if eviction_rate > s.eviction_rate_max && max_entries < s.entries_ceiling {
            let grown = scale_count(max_entries, 1.0 + s.capacity_step_ratio);
            max_entries = grown.max(max_entries + 1).min(s.entries_ceiling);
        }

        // Postconditions
        assert!(max_entries >= strategy.max_entries, "capacity must not shrink");
        assert!(
            ttl_ms >= strategy.ttl_ms.min(s.ttl_floor_ms),
            "ttl must not drop below the floor"
        );

        if ttl_ms == strategy.ttl_ms && max_entries == strategy.max_entries {
            return None;
        }

        Some(
            strategy
                .clone()
                .with_ttl_ms(ttl_ms)
                .with_max_entries(max_entries),
        )
    }

    /// Describe a change produced by [`Self::evaluate`].
    #[must_use]
    pub fn describe(
        old: &CacheStrategy,
        new: &CacheStrategy,
        metrics: &CachePerformanceMetrics,
    ) -> OptimizationChange {
        OptimizationChange {
            strategy: old.name.clone(),
            old_ttl_ms: old.ttl_ms,
            new_ttl_ms: new.ttl_ms,
            old_max_entries: old.max_entries,
            new_max_entries: new.max_entries,
            hit_rate: metrics.hit_rate(),
            eviction_rate: metrics.eviction_rate(),
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale(value: u64, factor: f64) -> u64 {
    (value as f64 * factor).round() as u64
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale_count(value: usize, factor: f64) -> usize {
    (value as f64 * factor).round() as usize
}

// =============================================================================
// Background Loop
// =============================================================================

/// Run `optimize_strategies` on a fixed interval.
///
/// The task holds only a weak handle and exits once the coordinator is
/// dropped. Returns `None` when auto-optimization is disabled.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_auto_optimizer<T: CacheValue>(
    coordinator: &Arc<CacheCoordinator<T>>,
) -> Option<JoinHandle<()>> {
    if !coordinator.auto_optimization_enabled() {
        debug!("auto-optimization disabled; not spawning optimizer");
        return None;
    }

    let interval_ms = coordinator.optimization_interval_ms();
    // Precondition
    assert!(interval_ms > 0, "optimization interval must be positive");

    let weak: Weak<CacheCoordinator<T>> = Arc::downgrade(coordinator);
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(coordinator) = weak.upgrade() else {
                info!("coordinator dropped; auto-optimizer exiting");
                break;
            };
            let changes = coordinator.optimize_strategies();
            debug!(changes = changes.len(), "auto-optimizer pass complete");
        }
    }))
}
