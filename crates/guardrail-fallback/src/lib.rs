//! Substitute results for failed operations.
//!
//! A fallback is the outermost safety net of a resilience pipeline: it runs
//! a primary operation and, if the primary fails for any reason, produces a
//! substitute result from one of three strategies:
//!
//! - a fixed **default value**,
//! - an **alternate operation** (which may itself fail), or
//! - the **cached last-good value** the primary previously produced.
//!
//! [`FallbackChain`] extends the idea to an ordered list of alternates tried
//! in sequence.
//!
//! # Examples
//!
//! ```
//! use guardrail_fallback::Fallback;
//!
//! # #[derive(Debug)]
//! # struct UpstreamError;
//! # async fn example() {
//! let fallback = Fallback::with_default(0u64);
//!
//! let count = fallback
//!     .execute(|| async { Err::<u64, _>(UpstreamError) })
//!     .await;
//! assert_eq!(count.unwrap(), 0);
//! # }
//! ```

mod config;
mod error;
mod events;

pub use config::{FallbackConfig, FallbackConfigBuilder};
pub use error::FallbackError;
pub use events::FallbackEvent;

use config::FallbackStrategy;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::counter;

pub(crate) type FallbackFn<Res, E> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Res, E>> + Send + Sync>;

/// Point-in-time snapshot of a fallback wrapper's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackStats {
    /// Calls that went through the wrapper, whichever path resolved them.
    pub total_operations: u64,
    /// Calls the primary path resolved on its own.
    pub primary_successes: u64,
    /// Calls where the fallback strategy was consulted.
    pub fallback_count: u64,
}

/// Wraps a primary operation with a substitute-result strategy.
///
/// `Res` is the result type both the primary and the fallback produce; `E`
/// is the primary's error type.
pub struct Fallback<Res, E> {
    config: FallbackConfig<Res, E>,
    total_operations: AtomicU64,
    primary_successes: AtomicU64,
    fallback_count: AtomicU64,
}

impl<Res, E> Fallback<Res, E> {
    /// Creates a new configuration builder.
    pub fn builder() -> FallbackConfigBuilder<Res, E> {
        FallbackConfigBuilder::new()
    }

    /// A fallback that substitutes `value` when the primary fails.
    pub fn with_default(value: Res) -> Self {
        Self::builder().default_value(value).build()
    }

    /// A fallback that invokes `f` when the primary fails.
    pub fn with_fallback_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        Self::builder().fallback_fn(f).build()
    }

    /// A fallback that substitutes the last value the primary produced.
    pub fn with_cache() -> Self {
        Self::builder().cache().build()
    }

    pub(crate) fn new(config: FallbackConfig<Res, E>) -> Self {
        Self {
            config,
            total_operations: AtomicU64::new(0),
            primary_successes: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> FallbackStats {
        FallbackStats {
            total_operations: self.total_operations.load(Ordering::Acquire),
            primary_successes: self.primary_successes.load(Ordering::Acquire),
            fallback_count: self.fallback_count.load(Ordering::Acquire),
        }
    }
}

// The strategies hand out owned results, so applying (and caching) them
// needs `Res: Clone`.
impl<Res: Clone, E> Fallback<Res, E> {
    /// Runs `primary` and, if it fails, resolves the call through the
    /// configured strategy.
    ///
    /// With the cache strategy, a primary success overwrites the cached
    /// value before returning.
    pub async fn execute<F, Fut>(&self, primary: F) -> Result<Res, FallbackError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Res, E>>,
    {
        self.total_operations.fetch_add(1, Ordering::AcqRel);

        match primary().await {
            Ok(value) => {
                self.record_primary_success(&value);
                Ok(value)
            }
            Err(_) => {
                self.fallback_count.fetch_add(1, Ordering::AcqRel);
                self.apply_strategy().await
            }
        }
    }

    /// Runs `primary` and, if it fails, returns the per-call `fallback`
    /// value directly, bypassing the configured strategy. Never fails.
    ///
    /// Counters (and the cache, for the cache strategy) are updated the
    /// same way as in [`execute`](Fallback::execute).
    pub async fn execute_with_fallback<F, Fut>(&self, primary: F, fallback: Res) -> Res
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Res, E>>,
    {
        self.total_operations.fetch_add(1, Ordering::AcqRel);

        match primary().await {
            Ok(value) => {
                self.record_primary_success(&value);
                value
            }
            Err(_) => {
                self.fallback_count.fetch_add(1, Ordering::AcqRel);
                self.emit_applied();
                fallback
            }
        }
    }

    fn record_primary_success(&self, value: &Res) {
        self.primary_successes.fetch_add(1, Ordering::AcqRel);

        if let FallbackStrategy::Cache(slot) = &self.config.strategy {
            *slot.write().unwrap_or_else(PoisonError::into_inner) = Some(value.clone());
        }

        self.config
            .event_listeners
            .emit(&FallbackEvent::PrimarySucceeded {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            });

        #[cfg(feature = "metrics")]
        counter!("fallback_primary_success_total", "fallback" => self.config.name.clone())
            .increment(1);
    }

    async fn apply_strategy(&self) -> Result<Res, FallbackError<E>> {
        let result = match &self.config.strategy {
            FallbackStrategy::Value(value) => Ok(value.clone()),
            FallbackStrategy::Function(f) => f().await.map_err(FallbackError::FallbackFailed),
            FallbackStrategy::Cache(slot) => slot
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(FallbackError::Exhausted),
        };

        match &result {
            Ok(_) => self.emit_applied(),
            Err(_) => {
                self.config
                    .event_listeners
                    .emit(&FallbackEvent::FallbackFailed {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                    });

                #[cfg(feature = "tracing")]
                tracing::debug!(fallback = %self.config.name, "fallback failed");

                #[cfg(feature = "metrics")]
                counter!("fallback_failed_total", "fallback" => self.config.name.clone())
                    .increment(1);
            }
        }

        result
    }

    fn emit_applied(&self) {
        self.config
            .event_listeners
            .emit(&FallbackEvent::FallbackApplied {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
            });

        #[cfg(feature = "metrics")]
        counter!("fallback_applied_total", "fallback" => self.config.name.clone()).increment(1);
    }
}

/// An ordered list of alternate operations tried in sequence after the
/// primary fails.
///
/// The chain resolves to the first success. If every link fails, the last
/// link's error is surfaced; an empty chain reports exhaustion.
pub struct FallbackChain<Res, E> {
    links: Vec<FallbackFn<Res, E>>,
}

impl<Res, E> Default for FallbackChain<Res, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res, E> FallbackChain<Res, E> {
    /// An empty chain.
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Appends an alternate operation to the end of the chain.
    pub fn link<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.links.push(Arc::new(move || f().boxed()));
        self
    }

    /// Number of alternates in the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True if the chain holds no alternates.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Runs `primary`, then each alternate in order until one succeeds.
    pub async fn execute<F, Fut>(&self, primary: F) -> Result<Res, FallbackError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Res, E>>,
    {
        let mut last_error = match primary().await {
            Ok(value) => return Ok(value),
            Err(e) => Some(e),
        };

        for (index, fallback) in self.links.iter().enumerate() {
            match fallback().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(link = index, "fallback chain link failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = index;

                    last_error = Some(e);
                }
            }
        }

        // The chain only lacks a last error when it has no links and the
        // primary error was consumed above; with no links, `last_error` is
        // the primary's error.
        match last_error {
            Some(e) if !self.links.is_empty() => Err(FallbackError::FallbackFailed(e)),
            _ => Err(FallbackError::Exhausted),
        }
    }
}
