//! Telemetry - Structured Logging Setup
//!
//! `TigerStyle`: Optional subscriber installation with explicit errors. The
//! library only emits `tracing` events; embedders decide where they go.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use haven_cache::telemetry::{init_telemetry, TelemetryConfig};
//!
//! // Defaults: `RUST_LOG` if set, otherwise `haven_cache=info`
//! init_telemetry(&TelemetryConfig::default()).expect("telemetry init");
//!
//! // Or configure explicitly
//! let config = TelemetryConfig::builder()
//!     .filter("haven_cache=debug")
//!     .ansi(false)
//!     .build();
//! init_telemetry(&config).expect("telemetry init");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG` - Overrides the configured filter when `use_env` is set (default)

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::constants::TELEMETRY_FILTER_DEFAULT;

/// Telemetry configuration errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber installation failed, usually because one is already set
    #[error("telemetry initialization failed: {reason}")]
    InitFailed {
        /// The reason for the failure
        reason: String,
    },

    /// Filter directive could not be parsed
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The rejected directive
        filter: String,
        /// Parser message
        reason: String,
    },
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Configuration for the `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directive, e.g. `haven_cache=debug`
    pub filter: String,

    /// Prefer `RUST_LOG` over `filter` when it is set
    pub use_env: bool,

    /// Include event targets in output
    pub with_target: bool,

    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: TELEMETRY_FILTER_DEFAULT.to_string(),
            use_env: true,
            with_target: true,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create a new builder for `TelemetryConfig`
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Check that the filter parses.
    ///
    /// # Errors
    /// Returns `InvalidFilter` for an empty or malformed directive.
    pub fn validate(&self) -> Result<()> {
        self.env_filter().map(|_| ())
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        if self.filter.trim().is_empty() {
            return Err(TelemetryError::InvalidFilter {
                filter: self.filter.clone(),
                reason: "filter cannot be empty".to_string(),
            });
        }

        if self.use_env {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }

        EnvFilter::try_new(&self.filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Builder for `TelemetryConfig`
#[derive(Default)]
pub struct TelemetryConfigBuilder {
    filter: Option<String>,
    use_env: Option<bool>,
    with_target: Option<bool>,
    ansi: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Set the filter directive
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Whether `RUST_LOG` overrides the filter
    #[must_use]
    pub fn use_env(mut self, use_env: bool) -> Self {
        self.use_env = Some(use_env);
        self
    }

    /// Whether to print event targets
    #[must_use]
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = Some(with_target);
        self
    }

    /// Whether to emit ANSI colors
    #[must_use]
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = Some(ansi);
        self
    }

    /// Build the `TelemetryConfig`
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let default = TelemetryConfig::default();
        TelemetryConfig {
            filter: self.filter.unwrap_or(default.filter),
            use_env: self.use_env.unwrap_or(default.use_env),
            with_target: self.with_target.unwrap_or(default.with_target),
            ansi: self.ansi.unwrap_or(default.ansi),
        }
    }
}

/// Install a global `fmt` subscriber with the given configuration.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directive does not parse.
/// Returns `TelemetryError::InitFailed` if a global subscriber is already set.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| TelemetryError::InitFailed {
            reason: e.to_string(),
        })?;

    tracing::debug!(filter = %config.filter, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.filter, TELEMETRY_FILTER_DEFAULT);
        assert!(config.use_env);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::builder()
            .filter("haven_cache=trace")
            .use_env(false)
            .with_target(false)
            .ansi(false)
            .build();

        assert_eq!(config.filter, "haven_cache=trace");
        assert!(!config.use_env);
        assert!(!config.with_target);
        assert!(!config.ansi);
    }

    #[test]
    fn test_telemetry_config_validation() {
        let config = TelemetryConfig::builder().filter("").use_env(false).build();
        assert!(matches!(
            config.validate(),
            Err(TelemetryError::InvalidFilter { .. })
        ));

        let config = TelemetryConfig::builder()
            .filter("haven_cache=notalevel")
            .use_env(false)
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig::builder().use_env(false).ansi(false).build();
        // Another test may have installed a subscriber first; either way the
        // second call must report it.
        let _ = init_telemetry(&config);
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::InitFailed { .. })
        ));
    }
}
