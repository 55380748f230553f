//! Eviction policies for bounded strategy stores.
//!
//! `TigerStyle`: Deterministic selection, pure functions, explicit ordering.
//!
//! Each policy maps an entry to an ordering key; the smallest keys are
//! evicted first. Store-local sequence numbers are the final tie-breaker so
//! the choice never depends on map iteration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entry::CacheEntry;

/// Policy used to pick victims when a store is at capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Least recently read first
    #[default]
    #[serde(rename = "LRU", alias = "lru")]
    Lru,
    /// Fewest hits first, older writes first on ties
    #[serde(rename = "LFU", alias = "lfu")]
    Lfu,
    /// Oldest write first
    #[serde(rename = "FIFO", alias = "fifo")]
    Fifo,
    /// Soonest expiry first, even if not yet expired
    #[serde(rename = "TTL", alias = "ttl")]
    Ttl,
    /// Lowest priority first, older writes first on ties
    #[serde(rename = "PRIORITY", alias = "priority")]
    Priority,
}

type OrderKey = (u64, u64, u64);

impl EvictionPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [Self; 5] = [Self::Lru, Self::Lfu, Self::Fifo, Self::Ttl, Self::Priority];

    /// Uppercase policy name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lru => "LRU",
            Self::Lfu => "LFU",
            Self::Fifo => "FIFO",
            Self::Ttl => "TTL",
            Self::Priority => "PRIORITY",
        }
    }

    /// Select up to `count` keys to evict from `entries`.
    ///
    /// # Postconditions
    /// - Returns exactly `min(count, entries.len())` distinct keys
    /// - Never mutates the entries
    pub fn select_victims<'a, T, I>(self, entries: I, count: usize) -> Vec<String>
    where
        T: 'a,
        I: IntoIterator<Item = &'a CacheEntry<T>>,
    {
        if count == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<(OrderKey, &str)> = entries
            .into_iter()
            .map(|entry| (self.order_key(entry), entry.key.as_str()))
            .collect();
        let available = candidates.len();

        let result: Vec<String> = if count == 1 {
            candidates
                .iter()
                .min_by_key(|(order, _)| *order)
                .map(|(_, key)| (*key).to_string())
                .into_iter()
                .collect()
        } else {
            candidates.sort_unstable_by_key(|(order, _)| *order);
            candidates
                .into_iter()
                .take(count)
                .map(|(_, key)| key.to_string())
                .collect()
        };

        // Postcondition
        assert_eq!(
            result.len(),
            count.min(available),
            "must select exactly min(count, len) victims"
        );

        result
    }

    fn order_key<T>(self, entry: &CacheEntry<T>) -> OrderKey {
        match self {
            Self::Lru => (entry.last_accessed_ms, entry.access_seq, 0),
            Self::Lfu => (entry.hit_count, entry.created_at_ms, entry.insert_seq),
            Self::Fifo => (entry.created_at_ms, entry.insert_seq, 0),
            Self::Ttl => (entry.expires_at_ms, entry.insert_seq, 0),
            Self::Priority => (
                u64::from(entry.priority.rank()),
                entry.created_at_ms,
                entry.insert_seq,
            ),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown eviction policy: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::Priority;

    fn entry(key: &str, created: u64, seq: u64) -> CacheEntry<u32> {
        let mut entry = CacheEntry::new(key, 0, Priority::Medium, 1, created, 1000);
        entry.insert_seq = seq;
        entry.access_seq = seq;
        entry
    }

    #[test]
    fn test_lru_evicts_least_recently_read() {
        let mut a = entry("a", 0, 1);
        let b = entry("b", 0, 2);
        let c = entry("c", 0, 3);
        a.record_hit(0, 4);

        let victims = EvictionPolicy::Lru.select_victims([&a, &b, &c], 1);
        assert_eq!(victims, vec!["b"]);
    }

    #[test]
    fn test_lfu_breaks_ties_by_age() {
        let mut a = entry("a", 10, 1);
        let b = entry("b", 20, 2);
        let c = entry("c", 5, 3);
        a.record_hit(30, 4);

        let victims = EvictionPolicy::Lfu.select_victims([&a, &b, &c], 2);
        assert_eq!(victims, vec!["c", "b"]);
    }

    #[test]
    fn test_fifo_evicts_oldest_write() {
        let a = entry("a", 30, 1);
        let b = entry("b", 10, 2);
        let c = entry("c", 20, 3);

        let victims = EvictionPolicy::Fifo.select_victims([&a, &b, &c], 1);
        assert_eq!(victims, vec!["b"]);
    }

    #[test]
    fn test_ttl_evicts_soonest_expiry() {
        let mut a = entry("a", 0, 1);
        let mut b = entry("b", 0, 2);
        a.expires_at_ms = 900;
        b.expires_at_ms = 300;
        let c = entry("c", 0, 3);

        let victims = EvictionPolicy::Ttl.select_victims([&a, &b, &c], 1);
        assert_eq!(victims, vec!["b"]);
    }

    #[test]
    fn test_priority_evicts_lowest_rank_first() {
        let mut low = entry("low", 50, 1);
        low.priority = Priority::Low;
        let mut high = entry("high", 0, 2);
        high.priority = Priority::High;
        let mut critical = entry("critical", 0, 3);
        critical.priority = Priority::Critical;

        let victims = EvictionPolicy::Priority.select_victims([&critical, &high, &low], 1);
        assert_eq!(victims, vec!["low"]);
    }

    #[test]
    fn test_priority_all_critical_still_evicts() {
        let mut older = entry("older", 0, 1);
        older.priority = Priority::Critical;
        let mut newer = entry("newer", 10, 2);
        newer.priority = Priority::Critical;

        let victims = EvictionPolicy::Priority.select_victims([&newer, &older], 1);
        assert_eq!(victims, vec!["older"]);
    }

    #[test]
    fn test_count_larger_than_entries() {
        let a = entry("a", 0, 1);
        let victims = EvictionPolicy::Fifo.select_victims([&a], 5);
        assert_eq!(victims, vec!["a"]);
    }

    #[test]
    fn test_count_zero_and_empty() {
        let a = entry("a", 0, 1);
        assert!(EvictionPolicy::Lru.select_victims([&a], 0).is_empty());
        let none: [&CacheEntry<u32>; 0] = [];
        assert!(EvictionPolicy::Lru.select_victims(none, 1).is_empty());
    }

    #[test]
    fn test_select_does_not_mutate() {
        let a = entry("a", 0, 1);
        let before = a.clone();
        let _ = EvictionPolicy::Lfu.select_victims([&a], 1);
        assert_eq!(a, before);
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!("lru".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
        assert_eq!(
            "Priority".parse::<EvictionPolicy>().unwrap(),
            EvictionPolicy::Priority
        );
        assert!("random".parse::<EvictionPolicy>().is_err());

        assert_eq!(serde_json::to_string(&EvictionPolicy::Ttl).unwrap(), r#""TTL""#);
        let parsed: EvictionPolicy = serde_json::from_str(r#""fifo""#).unwrap();
        assert_eq!(parsed, EvictionPolicy::Fifo);
    }
}
