//! DeterministicRng - Seeded Random Number Generator
//!
//! `TigerStyle`: ChaCha20-based RNG for deterministic simulation. Fault rolls,
//! generated cache workloads (keys, time steps) and property-test operations
//! all draw from it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A deterministic random number generator.
///
/// TigerStyle:
/// - Same seed always produces same sequence
/// - Fork creates independent streams
/// - All randomness flows through this
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    rng: ChaCha20Rng,
    seed: u64,
    /// Counter for generating fork seeds
    fork_counter: u64,
}

impl DeterministicRng {
    /// Create a new RNG with the given seed.
    ///
    /// # Example
    /// ```
    /// use haven_cache::dst::DeterministicRng;
    /// let mut rng = DeterministicRng::new(42);
    /// let key = rng.next_key(100);
    /// assert!(key.starts_with('k'));
    /// ```
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Get the original seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random float in [0, 1).
    pub fn next_float(&mut self) -> f64 {
        let value = self.rng.gen::<f64>();

        // Postcondition
        assert!((0.0..1.0).contains(&value), "float must be in [0, 1)");
        value
    }

    /// Generate a random u64.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }

    /// Generate a random usize in [min, max] (inclusive).
    ///
    /// # Panics
    /// Panics if min > max.
    pub fn next_usize(&mut self, min: usize, max: usize) -> usize {
        // Precondition
        assert!(min <= max, "min ({min}) must be <= max ({max})");

        self.rng.gen_range(min..=max)
    }

    /// Generate a random boolean with the given probability of true.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    pub fn next_bool(&mut self, probability: f64) -> bool {
        // Precondition
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability must be in [0, 1], got {probability}"
        );

        self.next_float() < probability
    }

    /// Choose a random element from a slice.
    ///
    /// # Panics
    /// Panics if the slice is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        // Precondition
        assert!(!items.is_empty(), "cannot choose from empty slice");

        let index = self.next_usize(0, items.len() - 1);
        &items[index]
    }

    /// Create an independent fork of this RNG.
    ///
    /// TigerStyle: Forks have independent sequences derived from parent.
    pub fn fork(&mut self) -> Self {
        // Golden ratio increment spreads fork seeds
        let fork_seed = self.seed.wrapping_add(
            self.fork_counter
                .wrapping_add(1)
                .wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        self.fork_counter += 1;

        Self::new(fork_seed)
    }

    /// Pick a workload key `k0..k{keyspace - 1}`.
    ///
    /// A keyspace larger than the strategy capacity forces evictions.
    ///
    /// # Panics
    /// Panics if keyspace is zero.
    pub fn next_key(&mut self, keyspace: usize) -> String {
        // Precondition
        assert!(keyspace > 0, "keyspace must be positive");

        format!("k{}", self.next_usize(0, keyspace - 1))
    }

    /// Generate a duration in [`min_ms`, `max_ms`] (inclusive).
    ///
    /// # Panics
    /// Panics if `min_ms` > `max_ms`.
    pub fn next_ms(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        // Precondition
        assert!(min_ms <= max_ms, "min_ms ({min_ms}) must be <= max_ms ({max_ms})");

        self.rng.gen_range(min_ms..=max_ms)
    }
}
