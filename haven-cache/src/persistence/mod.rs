//! Persistence - Durable Store Trait, Codec and Simulation
//!
//! `TigerStyle`: Abstract durability with simulation-first testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               CacheCoordinator               │
//! └──────────────────────────────────────────────┘
//!            │ encode_entry / decode_entry
//!            ↓
//! ┌──────────────────────────────────────────────┐
//! │             DurableStore Trait               │
//! └──────────────────────────────────────────────┘
//!            ↑                        ↑
//! ┌──────────┴─────────┐   ┌──────────┴─────────┐
//! │  SimDurableStore   │   │ embedder-provided  │
//! │    (testing)       │   │      backend       │
//! └────────────────────┘   └────────────────────┘
//! ```
//!
//! Durable keys are `"{strategy}:{key}"`.

mod backend;
mod codec;
mod error;
mod sim;

pub use backend::DurableStore;
pub use codec::{decode_entry, encode_entry};
pub use error::{PersistenceError, PersistenceResult};
pub use sim::SimDurableStore;

use crate::constants::DURABLE_KEY_SEPARATOR;

/// Durable store key for `key` under `strategy`.
#[must_use]
pub fn durable_key(strategy: &str, key: &str) -> String {
    format!("{strategy}{DURABLE_KEY_SEPARATOR}{key}")
}
