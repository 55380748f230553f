//! Persistence Errors
//!
//! `TigerStyle`: Explicit error types with context.

use thiserror::Error;

/// Errors from the durable persistence layer.
///
/// None of these are fatal to the coordinator: writes degrade to
/// memory-only caching and reads degrade to a miss.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// `put` failed
    #[error("durable write failed for {key}: {message}")]
    WriteFailed {
        /// Durable key being written
        key: String,
        /// Backend message
        message: String,
    },

    /// `get` failed
    #[error("durable read failed for {key}: {message}")]
    ReadFailed {
        /// Durable key being read
        key: String,
        /// Backend message
        message: String,
    },

    /// `remove` failed
    #[error("durable remove failed for {key}: {message}")]
    RemoveFailed {
        /// Durable key being removed
        key: String,
        /// Backend message
        message: String,
    },

    /// Stored bytes could not be decoded
    #[error("corrupted persisted entry: {message}")]
    Corrupted {
        /// Decoder message
        message: String,
    },

    /// Entry could not be encoded
    #[error("failed to encode entry: {message}")]
    Encode {
        /// Encoder message
        message: String,
    },

    /// Simulated fault (for DST)
    #[error("simulated fault: {fault_type}")]
    SimulatedFault {
        /// Type of simulated fault
        fault_type: String,
    },
}

impl PersistenceError {
    /// Create a write error.
    #[must_use]
    pub fn write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a read error.
    #[must_use]
    pub fn read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a remove error.
    #[must_use]
    pub fn remove(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoveFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a corruption error.
    #[must_use]
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Create an encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a simulated fault error.
    #[must_use]
    pub fn simulated_fault(fault_type: impl Into<String>) -> Self {
        Self::SimulatedFault {
            fault_type: fault_type.into(),
        }
    }

    /// Check if this is a transient error (the same call may succeed later).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::WriteFailed { .. }
                | Self::ReadFailed { .. }
                | Self::RemoveFailed { .. }
                | Self::SimulatedFault { .. }
        )
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
