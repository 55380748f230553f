//! Cache Entry - Data Model
//!
//! `TigerStyle`: Plain data, invariants asserted at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Retention priority of a cache entry.
///
/// Ordered `Low < Medium < High < Critical`; the PRIORITY eviction policy
/// evicts lower ranks first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Cheap to rebuild
    Low,
    /// Default for ordinary writes
    #[default]
    Medium,
    /// Preloaded or frequently needed data
    High,
    /// Must survive as long as capacity allows
    Critical,
}

impl Priority {
    /// Ordinal rank used by the PRIORITY eviction policy.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A single cached value plus its bookkeeping.
///
/// `insert_seq` and `access_seq` come from the owning store's logical clock.
/// They order entries whose millisecond timestamps are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// Key, unique within a strategy
    pub key: String,
    /// Opaque payload
    pub data: T,
    /// Write time (ms)
    pub created_at_ms: u64,
    /// Expiry time (ms), always after `created_at_ms`
    pub expires_at_ms: u64,
    /// Retention priority
    pub priority: Priority,
    /// Serialized payload size computed at insert
    pub size_bytes: usize,
    /// Successful non-expired reads since the last write
    pub hit_count: u64,
    /// Last successful read, or write time if never read (ms)
    pub last_accessed_ms: u64,
    pub(crate) insert_seq: u64,
    pub(crate) access_seq: u64,
}

impl<T> CacheEntry<T> {
    /// Build a fresh entry written at `now_ms` that lives for `ttl_ms`.
    ///
    /// # Panics
    /// Panics if `ttl_ms` is zero (expiry must follow creation).
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        data: T,
        priority: Priority,
        size_bytes: usize,
        now_ms: u64,
        ttl_ms: u64,
    ) -> Self {
        // Precondition
        assert!(ttl_ms > 0, "ttl_ms must be positive");

        let entry = Self {
            key: key.into(),
            data,
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(ttl_ms),
            priority,
            size_bytes,
            hit_count: 0,
            last_accessed_ms: now_ms,
            insert_seq: 0,
            access_seq: 0,
        };

        // Postcondition
        assert!(
            entry.expires_at_ms > entry.created_at_ms,
            "expires_at must follow created_at"
        );
        entry
    }

    /// Whether the entry has expired at `now_ms`.
    ///
    /// An entry is still live at exactly `expires_at_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Milliseconds left before expiry, zero once expired.
    #[must_use]
    pub fn remaining_ttl_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }

    pub(crate) fn record_hit(&mut self, now_ms: u64, seq: u64) {
        let before = self.hit_count;
        self.hit_count += 1;
        self.last_accessed_ms = now_ms.max(self.last_accessed_ms);
        self.access_seq = seq;

        // Postcondition
        assert!(self.hit_count > before, "hit_count must increase");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_fields() {
        let entry = CacheEntry::new("u1", "payload", Priority::High, 9, 1000, 500);

        assert_eq!(entry.key, "u1");
        assert_eq!(entry.created_at_ms, 1000);
        assert_eq!(entry.expires_at_ms, 1500);
        assert_eq!(entry.last_accessed_ms, 1000);
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.size_bytes, 9);
    }

    #[test]
    #[should_panic(expected = "ttl_ms must be positive")]
    fn test_zero_ttl_panics() {
        let _ = CacheEntry::new("k", 1, Priority::Low, 1, 0, 0);
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new("k", 1, Priority::Low, 1, 0, 100);

        assert!(!entry.is_expired(100));
        assert!(entry.is_expired(101));
        assert_eq!(entry.remaining_ttl_ms(40), 60);
        assert_eq!(entry.remaining_ttl_ms(200), 0);
    }

    #[test]
    fn test_record_hit() {
        let mut entry = CacheEntry::new("k", 1, Priority::Low, 1, 0, 100);
        entry.record_hit(50, 7);

        assert_eq!(entry.hit_count, 1);
        assert_eq!(entry.last_accessed_ms, 50);
        assert_eq!(entry.access_seq, 7);
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Low.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Critical.rank());
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse_and_serde() {
        assert_eq!("CRITICAL".parse::<Priority>().unwrap(), Priority::Critical);
        assert!("urgent".parse::<Priority>().is_err());

        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, r#""high""#);
    }
}
