//! Preload - Warm a Strategy from a Data Provider
//!
//! `TigerStyle`: Sequential, bounded, partial failure isolated per key.
//!
//! Each key is fetched through the caller's async provider and written with
//! high priority. A failing key is logged and skipped; the rest of the batch
//! still loads. Cancellation is cooperative and checked between keys.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::coordinator::{CacheCoordinator, CacheValue};
use super::entry::Priority;
use crate::constants::PRELOAD_KEYS_COUNT_MAX;
use crate::error::{CacheError, CacheResult};

/// Cooperative cancellation flag for a running preload.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct PreloadCancel(Arc<AtomicBool>);

impl PreloadCancel {
    /// Create an un-cancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The current key finishes first.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a preload batch.
#[derive(Debug, Default)]
pub struct PreloadSummary {
    /// Keys fetched and written, in order
    pub loaded: Vec<String>,
    /// One error per key that failed
    pub failures: Vec<CacheError>,
    /// Whether the batch stopped early on cancellation
    pub cancelled: bool,
}

impl PreloadSummary {
    /// Whether every key loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

impl<T: CacheValue> CacheCoordinator<T> {
    /// Fetch and cache every key with high priority.
    ///
    /// # Errors
    /// Returns `UnknownStrategy` or `PreloadTooLarge` before any fetch. Per-key
    /// failures are reported in the summary, never as an error.
    pub async fn preload<I, K, F, Fut, E>(
        &self,
        strategy: &str,
        keys: I,
        fetch: F,
    ) -> CacheResult<PreloadSummary>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.preload_with_cancel(strategy, keys, fetch, &PreloadCancel::new())
            .await
    }

    /// [`Self::preload`], stopping before the next key once `cancel` fires.
    ///
    /// # Errors
    /// Returns `UnknownStrategy` or `PreloadTooLarge` before any fetch.
    #[tracing::instrument(skip(self, keys, fetch, cancel))]
    pub async fn preload_with_cancel<I, K, F, Fut, E>(
        &self,
        strategy: &str,
        keys: I,
        fetch: F,
        cancel: &PreloadCancel,
    ) -> CacheResult<PreloadSummary>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.store(strategy)?;
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.len() > PRELOAD_KEYS_COUNT_MAX {
            return Err(CacheError::preload_too_large(keys.len(), PRELOAD_KEYS_COUNT_MAX));
        }

        let total = keys.len();
        let mut summary = PreloadSummary::default();

        for key in keys {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                info!(strategy, loaded = summary.loaded.len(), total, "preload cancelled");
                break;
            }

            let data = match fetch(key.clone()).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(strategy, key = %key, error = %e, "preload fetch failed; skipping");
                    summary
                        .failures
                        .push(CacheError::preload_fetch(&key, e.to_string()));
                    continue;
                }
            };

            match self
                .set_with_priority(strategy, &key, data, Priority::High)
                .await
            {
                Ok(()) => summary.loaded.push(key),
                Err(e) => {
                    warn!(strategy, key = %key, error = %e, "preload write failed; skipping");
                    summary.failures.push(e);
                }
            }
        }

        debug!(
            strategy,
            loaded = summary.loaded.len(),
            failed = summary.failures.len(),
            total,
            "preload finished"
        );

        // Postcondition
        assert!(
            summary.loaded.len() + summary.failures.len() <= total,
            "preload cannot account for more keys than requested"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStrategy;
    use crate::config::CacheCoordinatorConfig;

    fn coordinator() -> CacheCoordinator<String> {
        CacheCoordinator::builder()
            .with_config(
                CacheCoordinatorConfig::empty()
                    .with_strategy(CacheStrategy::new("crisis_resources").with_max_entries(10)),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_preload_isolates_failures() {
        let cache = coordinator();

        let summary = cache
            .preload("crisis_resources", ["k1", "k2", "k3"], |key| async move {
                if key == "k2" {
                    Err("provider offline")
                } else {
                    Ok(format!("value for {key}"))
                }
            })
            .await
            .unwrap();

        assert_eq!(summary.loaded, vec!["k1", "k3"]);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(
            &summary.failures[0],
            CacheError::PreloadFetchFailed { key, .. } if key == "k2"
        ));
        assert!(!summary.is_complete());

        assert!(cache.get("crisis_resources", "k1").await.unwrap().is_some());
        assert!(cache.get("crisis_resources", "k2").await.unwrap().is_none());
        assert!(cache.get("crisis_resources", "k3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_preload_uses_high_priority() {
        let cache = coordinator();
        cache
            .preload("crisis_resources", vec!["hotline".to_string()], |key| async move {
                Ok::<_, String>(key)
            })
            .await
            .unwrap();

        let handle = cache.store("crisis_resources").unwrap();
        let store = handle.lock();
        assert_eq!(store.peek("hotline").unwrap().priority, Priority::High);
    }

    #[tokio::test]
    async fn test_preload_unknown_strategy() {
        let cache = coordinator();
        let err = cache
            .preload("nope", ["k"], |key| async move { Ok::<_, String>(key) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::UnknownStrategy { .. }));
    }

    #[tokio::test]
    async fn test_preload_too_large() {
        let cache = coordinator();
        let keys = (0..=PRELOAD_KEYS_COUNT_MAX).map(|i| format!("k{i}"));
        let err = cache
            .preload("crisis_resources", keys, |key| async move { Ok::<_, String>(key) })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::PreloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_preload_cancel_between_keys() {
        let cache = coordinator();
        let cancel = PreloadCancel::new();
        let trigger = cancel.clone();

        let summary = cache
            .preload_with_cancel(
                "crisis_resources",
                ["a", "b", "c"],
                |key| {
                    if key == "b" {
                        trigger.cancel();
                    }
                    async move { Ok::<_, String>(key) }
                },
                &cancel,
            )
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.loaded, vec!["a", "b"]);
        assert!(cache.get("crisis_resources", "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_preload_invalid_key_is_isolated() {
        let cache = coordinator();
        let summary = cache
            .preload("crisis_resources", ["", "ok"], |key| async move { Ok::<_, String>(key) })
            .await
            .unwrap();

        assert_eq!(summary.loaded, vec!["ok"]);
        assert!(matches!(summary.failures[0], CacheError::InvalidKey { .. }));
    }
}
