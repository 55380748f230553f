//! Cache Errors
//!
//! `TigerStyle`: Explicit error types with context.
//!
//! Only caller mistakes surface as errors. Persistence trouble degrades to
//! memory-only caching and is logged instead.

use thiserror::Error;

/// Errors returned by the cache coordinator.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// No strategy registered under this name
    #[error("unknown cache strategy: {name}")]
    UnknownStrategy {
        /// Requested strategy name
        name: String,
    },

    /// A strategy with this name already exists
    #[error("cache strategy already registered: {name}")]
    StrategyAlreadyRegistered {
        /// Conflicting strategy name
        name: String,
    },

    /// Strategy still holds entries and cannot be removed
    #[error("cache strategy {name} still holds {entries} entries")]
    StrategyNotEmpty {
        /// Strategy name
        name: String,
        /// Entries still held
        entries: usize,
    },

    /// Strategy configuration is out of bounds
    #[error("invalid strategy {name}: {reason}")]
    InvalidStrategy {
        /// Strategy name
        name: String,
        /// What is wrong
        reason: String,
    },

    /// Coordinator configuration is invalid
    #[error("invalid coordinator config: {reason}")]
    InvalidConfig {
        /// What is wrong
        reason: String,
    },

    /// Key is empty or too long
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// Offending key, truncated by the caller if huge
        key: String,
        /// What is wrong
        reason: String,
    },

    /// Payload could not be serialized
    #[error("failed to encode value for {key}: {message}")]
    Encode {
        /// Key being written
        key: String,
        /// Serializer message
        message: String,
    },

    /// Preload batch exceeds the per-call key limit
    #[error("preload batch of {count} keys exceeds max {max}")]
    PreloadTooLarge {
        /// Keys requested
        count: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Data provider failed during preload
    #[error("preload fetch failed for {key}: {message}")]
    PreloadFetchFailed {
        /// Key being fetched
        key: String,
        /// Provider message
        message: String,
    },
}

impl CacheError {
    /// Create an unknown strategy error.
    #[must_use]
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy { name: name.into() }
    }

    /// Create an already-registered error.
    #[must_use]
    pub fn already_registered(name: impl Into<String>) -> Self {
        Self::StrategyAlreadyRegistered { name: name.into() }
    }

    /// Create a not-empty error.
    #[must_use]
    pub fn not_empty(name: impl Into<String>, entries: usize) -> Self {
        Self::StrategyNotEmpty {
            name: name.into(),
            entries,
        }
    }

    /// Create an invalid strategy error.
    #[must_use]
    pub fn invalid_strategy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error.
    #[must_use]
    pub fn encode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a preload batch-size error.
    #[must_use]
    pub fn preload_too_large(count: usize, max: usize) -> Self {
        Self::PreloadTooLarge { count, max }
    }

    /// Create a preload fetch error.
    #[must_use]
    pub fn preload_fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreloadFetchFailed {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for coordinator operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::unknown_strategy("nope").to_string(),
            "unknown cache strategy: nope"
        );
        assert_eq!(
            CacheError::not_empty("user_data", 3).to_string(),
            "cache strategy user_data still holds 3 entries"
        );
        assert_eq!(
            CacheError::invalid_key("", "key is empty").to_string(),
            r#"invalid key "": key is empty"#
        );
    }

    #[test]
    fn test_constructors_match_variants() {
        assert!(matches!(
            CacheError::preload_fetch("k", "offline"),
            CacheError::PreloadFetchFailed { ref key, ref message } if key == "k" && message == "offline"
        ));
        assert!(matches!(
            CacheError::already_registered("s"),
            CacheError::StrategyAlreadyRegistered { ref name } if name == "s"
        ));
    }
}
