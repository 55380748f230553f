//! Durable Store Trait
//!
//! `TigerStyle`: Abstract three-method persistence capability.
//!
//! # Simulation-First
//!
//! Tests run against `SimDurableStore`. Embedders supply their own backing
//! technology by implementing this trait; the coordinator assumes nothing
//! beyond these three operations.

use std::fmt::Debug;

use async_trait::async_trait;

use super::error::PersistenceResult;

/// Abstract durable key-value store for persisted cache entries.
///
/// TigerStyle: All operations are async, return explicit errors.
#[async_trait]
pub trait DurableStore: Send + Sync + Debug {
    /// Store bytes under `key`, replacing any previous value.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> PersistenceResult<()>;

    /// Get bytes stored under `key`.
    ///
    /// Returns None if the key does not exist.
    async fn get(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PersistenceResult<()>;
}
