//! `SimDurableStore` - In-Memory Durable Store for Testing
//!
//! `TigerStyle`: Deterministic testing with fault injection.
//!
//! # Simulation-First
//!
//! Coordinator persistence tests run against this store. Faults come from a
//! shared [`FaultInjector`], usually the one owned by a `Simulation`, so a
//! seed reproduces the exact sequence of failed writes and corrupted reads.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::backend::DurableStore;
use super::error::{PersistenceError, PersistenceResult};
use crate::constants::DST_DURABLE_VALUE_BYTES_MAX;
use crate::dst::{DeterministicRng, FaultInjector, FaultType, SimConfig};

/// Tag written over the first byte of a value to simulate corruption.
const CORRUPTION_TAG: u8 = 0xEE;

// =============================================================================
// SimDurableStore
// =============================================================================

/// In-memory durable store for testing.
///
/// `TigerStyle`:
/// - Deterministic via `DeterministicRng`
/// - Fault injection via `FaultInjector`
/// - Clones share the same map
#[derive(Debug, Clone)]
pub struct SimDurableStore {
    values: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fault_injector: Arc<FaultInjector>,
}

impl SimDurableStore {
    /// Create a store with its own fault injector and no faults registered.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let mut rng = DeterministicRng::new(config.seed());
        Self::with_fault_injector(Arc::new(FaultInjector::new(rng.fork())))
    }

    /// Create a store sharing an external fault injector.
    #[must_use]
    pub fn with_fault_injector(fault_injector: Arc<FaultInjector>) -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            fault_injector,
        }
    }

    /// Fault injector for inspection.
    #[must_use]
    pub fn fault_injector(&self) -> &Arc<FaultInjector> {
        &self.fault_injector
    }

    /// Number of stored values (for testing).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Whether `key` is stored, bypassing fault injection.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Write raw bytes, bypassing fault injection (for testing).
    pub fn put_raw(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.values.write().insert(key.into(), bytes);
    }

    /// Read raw bytes, bypassing fault injection (for testing).
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.values.read().get(key).cloned()
    }

    fn maybe_inject_fault(&self, operation: &str) -> Option<FaultType> {
        self.fault_injector.should_inject(operation)
    }
}

#[async_trait]
impl DurableStore for SimDurableStore {
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn put(&self, key: &str, bytes: Vec<u8>) -> PersistenceResult<()> {
        if let Some(fault) = self.maybe_inject_fault("durable_put") {
            return Err(PersistenceError::simulated_fault(format!(
                "{} during put {key}",
                fault.as_str()
            )));
        }

        // Precondition
        assert!(
            bytes.len() <= DST_DURABLE_VALUE_BYTES_MAX,
            "value exceeds DST_DURABLE_VALUE_BYTES_MAX"
        );

        self.values.write().insert(key.to_string(), bytes);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let fault = self.maybe_inject_fault("durable_get");
        if fault == Some(FaultType::DurableReadFail) {
            return Err(PersistenceError::read(key, "simulated read failure"));
        }

        let value = self.values.read().get(key).cloned();
        match (fault, value) {
            (Some(FaultType::DurableCorruption), Some(mut bytes)) => {
                match bytes.first_mut() {
                    Some(first) => *first = CORRUPTION_TAG,
                    None => bytes.push(CORRUPTION_TAG),
                }
                Ok(Some(bytes))
            }
            (_, value) => Ok(value),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, key: &str) -> PersistenceResult<()> {
        if let Some(fault) = self.maybe_inject_fault("durable_remove") {
            return Err(PersistenceError::remove(key, fault.as_str()));
        }

        self.values.write().remove(key);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::{FaultConfig, FaultInjectorBuilder};

    fn faulty(config: FaultConfig) -> SimDurableStore {
        let injector = FaultInjectorBuilder::new(DeterministicRng::new(42))
            .with_fault(config)
            .build();
        SimDurableStore::with_fault_injector(Arc::new(injector))
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = SimDurableStore::new(SimConfig::with_seed(42));

        store.put("user_data:u1", vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get("user_data:u1").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);

        store.remove("user_data:u1").await.unwrap();
        assert_eq!(store.get("user_data:u1").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let store = SimDurableStore::new(SimConfig::with_seed(42));
        assert!(store.remove("nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SimDurableStore::new(SimConfig::with_seed(42));
        let other = store.clone();

        store.put("k", vec![7]).await.unwrap();
        assert!(other.contains_key("k"));
    }

    #[tokio::test]
    async fn test_write_fault() {
        let store = faulty(FaultConfig::new(FaultType::DurableWriteFail, 1.0));

        let err = store.put("k", vec![1]).await.unwrap_err();
        assert!(matches!(err, PersistenceError::SimulatedFault { .. }));
        assert!(err.is_transient());
        assert!(!store.contains_key("k"));
    }

    #[tokio::test]
    async fn test_read_fault() {
        let store = faulty(FaultConfig::new(FaultType::DurableReadFail, 1.0));
        store.put_raw("k", vec![1]);

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, PersistenceError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_corruption_garbles_first_byte() {
        let store = faulty(FaultConfig::new(FaultType::DurableCorruption, 1.0));
        store.put_raw("k", vec![0, b'{', b'}']);

        let bytes = store.get("k").await.unwrap().unwrap();
        assert_eq!(bytes, vec![CORRUPTION_TAG, b'{', b'}']);
        assert_eq!(store.get_raw("k"), Some(vec![0, b'{', b'}']));

        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_max_injections_then_recovers() {
        let store = faulty(FaultConfig::new(FaultType::DurableWriteFail, 1.0).with_max_injections(1));

        assert!(store.put("k", vec![1]).await.is_err());
        assert!(store.put("k", vec![1]).await.is_ok());
        assert_eq!(store.fault_injector().total_injections(), 1);
    }
}
