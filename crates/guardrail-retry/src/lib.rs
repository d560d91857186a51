//! Bounded retry loop around an unreliable async operation.
//!
//! A [`Retrier`] invokes a caller-supplied operation, and on failure sleeps
//! according to the configured backoff strategy before invoking it again, up
//! to a bounded number of retries. When the retries are used up the **last**
//! observed error is returned unchanged; nothing is wrapped or annotated.
//!
//! # Examples
//!
//! ```
//! use guardrail_retry::Retrier;
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct UpstreamError;
//! # async fn example() {
//! let retrier: Retrier<UpstreamError> = Retrier::builder()
//!     .max_retries(5)
//!     .exponential_backoff(Duration::from_millis(100))
//!     .on_retry(|attempt, delay| {
//!         println!("attempt {} failed; retrying after {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! let result = retrier
//!     .execute(|| async { Ok::<_, UpstreamError>("response") })
//!     .await;
//! assert!(result.is_ok());
//! # }
//! ```
//!
//! # Composition
//!
//! Retry should wrap only the innermost operation, never a circuit breaker or
//! bulkhead: retrying a rejection from either would hammer a dependency that
//! is already known to be failing or saturated.

mod backoff;
mod config;
mod events;

pub use backoff::{
    ExponentialBackoff, ExponentialJitterBackoff, FixedInterval, FnInterval, Immediate,
    IntervalFunction, LinearBackoff,
};
pub use config::{RetryConfig, RetryConfigBuilder, RetryPredicate};
pub use events::RetryEvent;

use guardrail_core::events::EventListeners;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::counter;

/// Snapshot of the most recent execution's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryStats {
    /// Attempts made, including the first.
    pub attempts: u64,
    /// Total time slept between attempts, in milliseconds.
    pub total_delay_ms: u64,
}

/// Drives a bounded retry loop around an async operation.
///
/// The retrier itself is immutable and can be shared across calls; the stats
/// counters are reset at the start of every [`execute`](Retrier::execute).
pub struct Retrier<E> {
    config: Arc<RetryConfig<E>>,
    attempts: AtomicU64,
    total_delay_ms: AtomicU64,
}

impl<E> Retrier<E> {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    pub(crate) fn new(config: RetryConfig<E>) -> Self {
        Self {
            config: Arc::new(config),
            attempts: AtomicU64::new(0),
            total_delay_ms: AtomicU64::new(0),
        }
    }

    /// Retrier with a fixed delay between attempts.
    pub fn fixed_delay(delay: Duration, max_retries: u32) -> Self {
        Self::builder()
            .fixed_delay(delay)
            .max_retries(max_retries)
            .build()
    }

    /// Retrier with no delay between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self::builder().immediate().max_retries(max_retries).build()
    }

    /// Stats from the most recent (or in-flight) execution.
    pub fn stats(&self) -> RetryStats {
        RetryStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            total_delay_ms: self.total_delay_ms.load(Ordering::Relaxed),
        }
    }

    fn listeners(&self) -> &EventListeners<RetryEvent> {
        &self.config.event_listeners
    }

    /// Invokes `op` until it succeeds or the retries are used up.
    ///
    /// On exhaustion the last operation error is returned unchanged. Errors
    /// rejected by the configured [`retry_on`](RetryConfigBuilder::retry_on)
    /// predicate are returned immediately.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.attempts.store(0, Ordering::Relaxed);
        self.total_delay_ms.store(0, Ordering::Relaxed);

        let mut attempt: u32 = 1;
        loop {
            self.attempts.fetch_add(1, Ordering::Relaxed);

            match op().await {
                Ok(value) => {
                    self.listeners().emit(&RetryEvent::Success {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_success_total", "retry" => self.config.name.clone())
                        .increment(1);

                    return Ok(value);
                }
                Err(error) => {
                    if let Some(predicate) = &self.config.retry_predicate {
                        if !predicate(&error) {
                            self.listeners().emit(&RetryEvent::IgnoredError {
                                pattern_name: self.config.name.clone(),
                                timestamp: Instant::now(),
                            });
                            return Err(error);
                        }
                    }

                    if attempt > self.config.max_retries {
                        self.listeners().emit(&RetryEvent::Exhausted {
                            pattern_name: self.config.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("retry_exhausted_total", "retry" => self.config.name.clone())
                            .increment(1);

                        return Err(error);
                    }

                    let delay = self.config.interval_fn.delay_for(attempt);
                    self.listeners().emit(&RetryEvent::Retry {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        delay,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        retry = %self.config.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed; backing off"
                    );

                    #[cfg(feature = "metrics")]
                    counter!("retry_attempts_total", "retry" => self.config.name.clone())
                        .increment(1);

                    tokio::time::sleep(delay).await;
                    self.total_delay_ms
                        .fetch_add(delay.as_millis() as u64, Ordering::Relaxed);
                    attempt += 1;
                }
            }
        }
    }
}
