//! Cache Coordinator - Strategy Registry and Public API
//!
//! `TigerStyle`: One lock per strategy, no lock across `.await`, explicit errors.
//!
//! # Architecture
//!
//! ```text
//! CacheCoordinator<T>
//!   ├── RwLock<HashMap<name, Arc<Mutex<StrategyStore<T>>>>>
//!   │        held only long enough to clone a store handle
//!   ├── Arc<dyn Clock>          time for TTL and bookkeeping
//!   ├── Option<Arc<dyn DurableStore>>
//!   └── AutoOptimizer
//! ```
//!
//! Store work happens under the strategy's mutex. Durable-store I/O happens
//! after the mutex is released, so persistence latency never blocks other
//! callers of the same strategy. Persistence is best effort: failures are
//! logged and the in-memory view stays authoritative.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, Priority};
use super::metrics::CachePerformanceMetrics;
use super::optimizer::{AutoOptimizer, OptimizationChange};
use super::store::{Lookup, StrategyStore};
use super::strategy::CacheStrategy;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheCoordinatorConfig;
use crate::constants::CACHE_KEY_BYTES_MAX;
use crate::error::{CacheError, CacheResult};
use crate::persistence::{decode_entry, durable_key, encode_entry, DurableStore};

/// Values the coordinator can cache.
///
/// Payloads are sized and persisted through their JSON form.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

type StoreHandle<T> = Arc<Mutex<StrategyStore<T>>>;

// =============================================================================
// CacheCoordinator
// =============================================================================

/// Registry of named strategy stores and the single entry point for callers.
///
/// Construct once with [`CacheCoordinator::builder`] and share as
/// `Arc<CacheCoordinator<T>>`.
///
/// # Example
///
/// ```rust
/// use haven_cache::cache::CacheCoordinator;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let cache: CacheCoordinator<String> = CacheCoordinator::builder().build().unwrap();
///     cache.set("user_data", "u1", "Alex".to_string()).await.unwrap();
///     assert_eq!(cache.get("user_data", "u1").await.unwrap(), Some("Alex".to_string()));
/// });
/// ```
#[derive(Debug)]
pub struct CacheCoordinator<T> {
    stores: RwLock<HashMap<String, StoreHandle<T>>>,
    durable: Option<Arc<dyn DurableStore>>,
    clock: Arc<dyn Clock>,
    optimizer: AutoOptimizer,
    global_max_memory_bytes: usize,
    compression_threshold_bytes: usize,
    auto_optimization_enabled: bool,
    optimization_interval_ms: u64,
}

impl<T: CacheValue> CacheCoordinator<T> {
    /// Start building a coordinator.
    #[must_use]
    pub fn builder() -> CacheCoordinatorBuilder<T> {
        CacheCoordinatorBuilder::new()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Clock used for timestamps.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether a durable store is attached.
    #[must_use]
    pub fn has_durable_store(&self) -> bool {
        self.durable.is_some()
    }

    /// Whether the background optimizer should run.
    #[must_use]
    pub fn auto_optimization_enabled(&self) -> bool {
        self.auto_optimization_enabled
    }

    /// Interval between background optimizer passes (ms).
    #[must_use]
    pub fn optimization_interval_ms(&self) -> u64 {
        self.optimization_interval_ms
    }

    /// Memory budget across all strategies.
    #[must_use]
    pub fn global_max_memory_bytes(&self) -> usize {
        self.global_max_memory_bytes
    }

    pub(super) fn store(&self, strategy: &str) -> CacheResult<StoreHandle<T>> {
        self.stores
            .read()
            .get(strategy)
            .cloned()
            .ok_or_else(|| CacheError::unknown_strategy(strategy))
    }

    fn handles(&self) -> Vec<(String, StoreHandle<T>)> {
        let mut handles: Vec<(String, StoreHandle<T>)> = self
            .stores
            .read()
            .iter()
            .map(|(name, handle)| (name.clone(), Arc::clone(handle)))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        handles
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Write `data` under `key` with medium priority.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`, `InvalidKey` or `Encode`.
    pub async fn set(&self, strategy: &str, key: &str, data: T) -> CacheResult<()> {
        self.set_with_priority(strategy, key, data, Priority::Medium)
            .await
    }

    /// Write `data` under `key` with an explicit priority.
    ///
    /// Evicts per the strategy's policy if a new key would exceed capacity.
    /// Persistent strategies mirror the write into the durable store; a
    /// failed durable write is logged and the in-memory entry stays valid.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`, `InvalidKey` or `Encode`.
    #[tracing::instrument(skip(self, data))]
    pub async fn set_with_priority(
        &self,
        strategy: &str,
        key: &str,
        data: T,
        priority: Priority,
    ) -> CacheResult<()> {
        validate_key(key)?;
        let handle = self.store(strategy)?;
        let size_bytes = serde_json::to_vec(&data)
            .map_err(|e| CacheError::encode(key, e.to_string()))?
            .len();
        let now_ms = self.clock.now_ms();

        let (outcome, persist, encoded) = {
            let mut store = handle.lock();
            // The strategy may have been removed since the handle was cloned.
            if store.is_retired() {
                return Err(CacheError::unknown_strategy(strategy));
            }
            let outcome = store.set(key, data, priority, size_bytes, now_ms);
            let persist = self.persists(&store);
            let encoded = if persist {
                store.peek(key).and_then(|entry| self.encode(strategy, entry, store.config()))
            } else {
                None
            };
            (outcome, persist, encoded)
        };

        if let Some(bytes) = encoded {
            self.durable_put(strategy, key, bytes).await;
        }
        if persist {
            self.durable_remove_all(strategy, &outcome.evicted).await;
        }
        Ok(())
    }

    /// Read `key`.
    ///
    /// Absent and expired keys are a miss, never an error. For persistent
    /// strategies an in-memory miss falls back to the durable store; a valid
    /// persisted entry is restored into memory and counts as a hit.
    ///
    /// # Errors
    /// Returns `UnknownStrategy` only.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, strategy: &str, key: &str) -> CacheResult<Option<T>> {
        let handle = self.store(strategy)?;
        let now_ms = self.clock.now_ms();

        let (lookup, persist) = {
            let mut store = handle.lock();
            let lookup = store.lookup(key, now_ms);
            let persist = self.persists(&store);
            match &lookup {
                Lookup::Hit(_) => store.record_hit(),
                Lookup::Expired => store.record_miss(),
                Lookup::Miss if !persist => store.record_miss(),
                Lookup::Miss => {}
            }
            (lookup, persist)
        };

        match lookup {
            Lookup::Hit(data) => Ok(Some(data)),
            Lookup::Expired => {
                if persist {
                    self.durable_remove(strategy, key).await;
                }
                Ok(None)
            }
            Lookup::Miss if persist => Ok(self.rehydrate(strategy, key, &handle).await),
            Lookup::Miss => Ok(None),
        }
    }

    /// Load `key` from the durable store after an in-memory miss.
    ///
    /// Records exactly one hit or miss on the store.
    async fn rehydrate(&self, strategy: &str, key: &str, handle: &StoreHandle<T>) -> Option<T> {
        let Some(durable) = self.durable.as_ref() else {
            handle.lock().record_miss();
            return None;
        };
        let dkey = durable_key(strategy, key);

        let bytes = match durable.get(&dkey).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                handle.lock().record_miss();
                return None;
            }
            Err(e) => {
                warn!(strategy, key, error = %e, "durable read failed; treating as miss");
                handle.lock().record_miss();
                return None;
            }
        };

        let entry: CacheEntry<T> = match decode_entry(key, &bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(strategy, key, error = %e, "corrupted persisted entry; purging");
                handle.lock().record_miss();
                self.durable_remove(strategy, key).await;
                return None;
            }
        };

        let now_ms = self.clock.now_ms();
        if entry.is_expired(now_ms) {
            debug!(strategy, key, "persisted entry expired; purging");
            handle.lock().record_miss();
            self.durable_remove(strategy, key).await;
            return None;
        }

        let (data, evicted) = {
            let mut store = handle.lock();
            if store.is_retired() {
                store.record_miss();
                return None;
            }
            // A concurrent write may have landed while the lock was released.
            if let Lookup::Hit(data) = store.lookup(key, now_ms) {
                store.record_hit();
                return Some(data);
            }
            let data = entry.data.clone();
            let outcome = store.restore(entry, now_ms);
            store.record_hit();
            (data, outcome.evicted)
        };

        debug!(strategy, key, "restored entry from durable store");
        self.durable_remove_all(strategy, &evicted).await;
        Some(data)
    }

    /// Remove `key`. Returns whether it was held in memory.
    ///
    /// The durable copy is removed too for persistent strategies.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate(&self, strategy: &str, key: &str) -> CacheResult<bool> {
        let handle = self.store(strategy)?;
        let (removed, persist) = {
            let mut store = handle.lock();
            (store.invalidate(key), self.persists(&store))
        };

        if persist {
            self.durable_remove(strategy, key).await;
        }
        Ok(removed)
    }

    /// Remove every entry of a strategy. Metrics are kept.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, strategy: &str) -> CacheResult<()> {
        let handle = self.store(strategy)?;
        let (cleared, persist) = {
            let mut store = handle.lock();
            (store.clear(), self.persists(&store))
        };

        debug!(strategy, count = cleared.len(), "cleared strategy");
        if persist {
            self.durable_remove_all(strategy, &cleared).await;
        }
        Ok(())
    }

    /// Remove expired entries from every strategy.
    ///
    /// Returns the number removed. Also reports the global memory budget.
    pub async fn sweep_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let mut total = 0;

        for (name, handle) in self.handles() {
            let (expired, persist) = {
                let mut store = handle.lock();
                (store.purge_expired(now_ms), self.persists(&store))
            };
            total += expired.len();
            if persist {
                self.durable_remove_all(&name, &expired).await;
            }
        }

        self.memory_budget_exceeded();
        total
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Metrics snapshot for one strategy.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`.
    pub fn metrics(&self, strategy: &str) -> CacheResult<CachePerformanceMetrics> {
        Ok(self.store(strategy)?.lock().metrics())
    }

    /// Metrics snapshot for every strategy, keyed by name.
    #[must_use]
    pub fn all_metrics(&self) -> BTreeMap<String, CachePerformanceMetrics> {
        self.handles()
            .into_iter()
            .map(|(name, handle)| {
                let metrics = handle.lock().metrics();
                (name, metrics)
            })
            .collect()
    }

    /// Zero one strategy's counters.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`.
    pub fn reset_metrics(&self, strategy: &str) -> CacheResult<()> {
        self.store(strategy)?.lock().reset_metrics();
        info!(strategy, "metrics reset");
        Ok(())
    }

    /// Zero every strategy's counters.
    pub fn reset_all_metrics(&self) {
        for (_, handle) in self.handles() {
            handle.lock().reset_metrics();
        }
        info!("all metrics reset");
    }

    /// Sum of entry sizes across all strategies.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.handles()
            .iter()
            .map(|(_, handle)| handle.lock().memory_usage())
            .sum()
    }

    /// Whether total memory exceeds the global budget, logging a warning if so.
    ///
    /// The budget is advisory: nothing is evicted across strategies.
    pub fn memory_budget_exceeded(&self) -> bool {
        let usage = self.memory_usage();
        let exceeded = usage > self.global_max_memory_bytes;
        if exceeded {
            warn!(
                usage_bytes = usage,
                budget_bytes = self.global_max_memory_bytes,
                "cache memory above global budget"
            );
        }
        exceeded
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register a new strategy.
    ///
    /// # Errors
    /// Returns `InvalidStrategy` or `StrategyAlreadyRegistered`.
    pub fn register_strategy(&self, strategy: CacheStrategy) -> CacheResult<()> {
        strategy.validate()?;

        let mut stores = self.stores.write();
        if stores.contains_key(&strategy.name) {
            return Err(CacheError::already_registered(&strategy.name));
        }
        info!(
            strategy = %strategy.name,
            max_entries = strategy.max_entries,
            ttl_ms = strategy.ttl_ms,
            policy = %strategy.eviction_policy,
            "registered strategy"
        );
        let name = strategy.name.clone();
        stores.insert(name, Arc::new(Mutex::new(StrategyStore::new(Arc::new(strategy)))));
        Ok(())
    }

    /// Remove an empty strategy, returning its configuration.
    ///
    /// The removed store is retired, so a write that cloned its handle before
    /// removal fails with `UnknownStrategy` instead of landing out of reach.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`, or `StrategyNotEmpty` while entries exist.
    pub fn remove_strategy(&self, strategy: &str) -> CacheResult<CacheStrategy> {
        let mut stores = self.stores.write();
        let handle = stores
            .get(strategy)
            .ok_or_else(|| CacheError::unknown_strategy(strategy))?;

        let config = {
            let mut store = handle.lock();
            if !store.is_empty() {
                return Err(CacheError::not_empty(strategy, store.len()));
            }
            // Writers holding a stale handle see this under the same lock.
            store.retire();
            CacheStrategy::clone(store.config())
        };

        stores.remove(strategy);
        info!(strategy, "removed strategy");
        Ok(config)
    }

    /// Replace a strategy's configuration, returning the old one.
    ///
    /// A smaller capacity evicts immediately.
    ///
    /// # Errors
    /// Returns `InvalidStrategy` or `UnknownStrategy`.
    pub async fn reconfigure(&self, strategy: CacheStrategy) -> CacheResult<CacheStrategy> {
        strategy.validate()?;
        let name = strategy.name.clone();
        let handle = self.store(&name)?;

        let (old, evicted, persist) = {
            let mut store = handle.lock();
            if store.is_retired() {
                return Err(CacheError::unknown_strategy(&name));
            }
            let (old, evicted) = store.replace_config(Arc::new(strategy));
            (old, evicted, self.persists(&store))
        };

        info!(strategy = %name, evicted = evicted.len(), "reconfigured strategy");
        if persist {
            self.durable_remove_all(&name, &evicted).await;
        }
        Ok(CacheStrategy::clone(&old))
    }

    /// Current configuration of a strategy.
    ///
    /// # Errors
    /// Returns `UnknownStrategy`.
    pub fn strategy(&self, strategy: &str) -> CacheResult<Arc<CacheStrategy>> {
        Ok(Arc::clone(self.store(strategy)?.lock().config()))
    }

    /// Registered strategy names, sorted.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }

    // =========================================================================
    // Optimization
    // =========================================================================

    /// Run one optimizer pass over every strategy, one lock at a time.
    ///
    /// Runs whether or not background optimization is enabled.
    pub fn optimize_strategies(&self) -> Vec<OptimizationChange> {
        let mut changes = Vec::new();

        for (name, handle) in self.handles() {
            let mut store = handle.lock();
            let metrics = store.metrics();
            let Some(tuned) = self.optimizer.evaluate(store.config(), &metrics) else {
                continue;
            };

            let (old, evicted) = store.replace_config(Arc::new(tuned));
            // Postcondition
            assert!(evicted.is_empty(), "optimizer must never shrink capacity");

            let change = AutoOptimizer::describe(&old, store.config(), &metrics);
            info!(
                strategy = %name,
                old_ttl_ms = change.old_ttl_ms,
                new_ttl_ms = change.new_ttl_ms,
                old_max_entries = change.old_max_entries,
                new_max_entries = change.new_max_entries,
                hit_rate = change.hit_rate,
                eviction_rate = change.eviction_rate,
                "optimized strategy"
            );
            changes.push(change);
        }

        self.memory_budget_exceeded();
        changes
    }

    // =========================================================================
    // Durable Store Helpers
    // =========================================================================

    fn persists(&self, store: &StrategyStore<T>) -> bool {
        self.durable.is_some() && store.config().persist_to_durable_store
    }

    fn encode(
        &self,
        strategy: &str,
        entry: &CacheEntry<T>,
        config: &CacheStrategy,
    ) -> Option<Vec<u8>> {
        match encode_entry(entry, config.compression_enabled, self.compression_threshold_bytes) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(strategy, key = %entry.key, error = %e, "cannot encode entry; memory only");
                None
            }
        }
    }

    async fn durable_put(&self, strategy: &str, key: &str, bytes: Vec<u8>) {
        let Some(durable) = self.durable.as_ref() else {
            return;
        };
        if let Err(e) = durable.put(&durable_key(strategy, key), bytes).await {
            warn!(strategy, key, error = %e, "durable write failed; entry stays memory only");
        }
    }

    async fn durable_remove(&self, strategy: &str, key: &str) {
        let Some(durable) = self.durable.as_ref() else {
            return;
        };
        if let Err(e) = durable.remove(&durable_key(strategy, key)).await {
            warn!(strategy, key, error = %e, "durable remove failed");
        }
    }

    async fn durable_remove_all(&self, strategy: &str, keys: &[String]) {
        for key in keys {
            self.durable_remove(strategy, key).await;
        }
    }
}

fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_key(key, "key is empty"));
    }
    if key.len() > CACHE_KEY_BYTES_MAX {
        let shown: String = key.chars().take(32).collect();
        return Err(CacheError::invalid_key(
            format!("{shown}..."),
            format!("key is {} bytes, max {CACHE_KEY_BYTES_MAX}", key.len()),
        ));
    }
    Ok(())
}

// =============================================================================
// CacheCoordinatorBuilder
// =============================================================================

/// Builder for constructing `CacheCoordinator` instances.
///
/// `TigerStyle`:
/// - Fluent API with method chaining
/// - Defaults: default config, `SystemClock`, no durable store
/// - `build()` validates the config and fails fast
#[derive(Debug)]
pub struct CacheCoordinatorBuilder<T> {
    config: Option<CacheCoordinatorConfig>,
    clock: Option<Arc<dyn Clock>>,
    durable: Option<Arc<dyn DurableStore>>,
    _value: PhantomData<fn() -> T>,
}

impl<T: CacheValue> Default for CacheCoordinatorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CacheValue> CacheCoordinatorBuilder<T> {
    /// Create a new builder with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            clock: None,
            durable: None,
            _value: PhantomData,
        }
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CacheCoordinatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Attach a durable store for persistent strategies.
    #[must_use]
    pub fn with_durable_store(mut self, durable: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Build the coordinator.
    ///
    /// # Errors
    /// Returns the first configuration validation error.
    pub fn build(self) -> CacheResult<CacheCoordinator<T>> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let persistent = config
            .strategies
            .iter()
            .filter(|s| s.persist_to_durable_store)
            .count();
        if persistent > 0 && self.durable.is_none() {
            debug!(persistent, "no durable store attached; persistent strategies run memory only");
        }

        let stores = config
            .strategies
            .into_iter()
            .map(|strategy| {
                let name = strategy.name.clone();
                let store = StrategyStore::new(Arc::new(strategy));
                (name, Arc::new(Mutex::new(store)))
            })
            .collect();

        Ok(CacheCoordinator {
            stores: RwLock::new(stores),
            durable: self.durable,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            optimizer: AutoOptimizer::new(config.optimizer),
            global_max_memory_bytes: config.global_max_memory_bytes,
            compression_threshold_bytes: config.compression_threshold_bytes,
            auto_optimization_enabled: config.auto_optimization_enabled,
            optimization_interval_ms: config.optimization_interval_ms,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
