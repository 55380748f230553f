//! SimClock - Simulated Time
//!
//! `TigerStyle`: Deterministic, controllable time for simulation. Cache entries
//! expire against this clock, so TTL tests never sleep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::constants::{DST_TIME_ADVANCE_MS_MAX, TIME_MS_PER_SEC};

/// A simulated clock for deterministic testing.
///
/// TigerStyle:
/// - Time only moves forward
/// - All time operations are explicit
/// - No reliance on system time
///
/// Clones share the same underlying time, so a clock handed to a coordinator
/// can be advanced from the test body.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Current time in milliseconds since epoch (thread-safe)
    current_ms: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    ///
    /// # Example
    /// ```
    /// use haven_cache::dst::SimClock;
    /// let clock = SimClock::new();
    /// assert_eq!(clock.now_ms(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::at_ms(0)
    }

    /// Create a clock starting at the given millisecond timestamp.
    #[must_use]
    pub fn at_ms(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Get current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Advance time by the given milliseconds.
    ///
    /// # Panics
    /// Panics if ms exceeds `DST_TIME_ADVANCE_MS_MAX`.
    ///
    /// # Returns
    /// The new current time.
    pub fn advance_ms(&self, ms: u64) -> u64 {
        // Preconditions
        assert!(
            ms <= DST_TIME_ADVANCE_MS_MAX,
            "advance_ms({ms}) exceeds max ({DST_TIME_ADVANCE_MS_MAX})"
        );

        let old_time = self.current_ms.fetch_add(ms, Ordering::SeqCst);
        let new_time = old_time.saturating_add(ms);

        // Postcondition
        assert!(new_time >= old_time, "time must not go backwards");

        new_time
    }

    /// Advance time by the given seconds.
    ///
    /// # Panics
    /// Panics if secs is negative or the resulting ms exceeds the max advance.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn advance_secs(&self, secs: f64) -> u64 {
        // Precondition
        assert!(secs >= 0.0, "secs must be non-negative, got {secs}");

        self.advance_ms((secs * TIME_MS_PER_SEC as f64) as u64)
    }

    /// Jump to `target_ms`, typically an entry's `expires_at_ms` or one past it.
    ///
    /// # Panics
    /// Panics if the target is in the past.
    pub fn advance_to_ms(&self, target_ms: u64) -> u64 {
        let current = self.now_ms();
        // Precondition
        assert!(
            target_ms >= current,
            "cannot move time backwards: {target_ms} < {current}"
        );

        self.current_ms.store(target_ms, Ordering::SeqCst);
        target_ms
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        SimClock::now_ms(self)
    }
}
