//! Clock - Time Source for Entry Timestamps
//!
//! `TigerStyle`: All time flows through an injectable interface so that TTL
//! behavior can be driven deterministically under simulation.

use std::fmt::Debug;

use chrono::Utc;

/// Source of millisecond timestamps for the coordinator.
///
/// Implementations must be monotonic non-decreasing for TTL math to hold.
pub trait Clock: Send + Sync + Debug {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // Pre-epoch system time is clamped to zero.
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_system_clock_does_not_go_backwards() {
        let clock = SystemClock;
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
    }
}
