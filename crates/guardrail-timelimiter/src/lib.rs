//! Wall-clock bounds for async operations.
//!
//! A time limiter runs an operation against a deadline. If the operation
//! completes first, its result passes through unchanged; if the deadline
//! elapses first, the caller gets [`TimeLimiterError::Timeout`] promptly and
//! the operation's future is dropped. Cancellation is cooperative: work the
//! operation already handed off (a spawned task, a fired request) may run to
//! completion in the background, and its result is discarded.
//!
//! # Examples
//!
//! ```
//! use guardrail_timelimiter::TimeLimiter;
//!
//! # #[derive(Debug)]
//! # struct UpstreamError;
//! # async fn example() {
//! let limiter = TimeLimiter::millis(250);
//!
//! let result = limiter
//!     .execute(|| async { Ok::<_, UpstreamError>("fast enough") })
//!     .await;
//! assert!(result.is_ok());
//! # }
//! ```
//!
//! With listeners:
//!
//! ```
//! use guardrail_timelimiter::TimeLimiterConfig;
//! use std::time::Duration;
//!
//! let limiter = TimeLimiterConfig::builder()
//!     .timeout_duration(Duration::from_secs(5))
//!     .name("report-render")
//!     .on_timeout(|limit| eprintln!("render exceeded {limit:?}"))
//!     .build();
//! ```

mod config;
mod error;
mod events;

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use error::TimeLimiterError;
pub use events::TimeLimiterEvent;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::counter;

/// An absolute point in time after which an operation is considered late.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: tokio::time::Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: tokio::time::Instant::now() + timeout,
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(tokio::time::Instant::now())
    }

    /// True once the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        self.remaining() == Duration::ZERO
    }
}

/// Bounds the wall-clock duration of a single operation invocation.
pub struct TimeLimiter {
    config: Arc<TimeLimiterConfig>,
}

impl TimeLimiter {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeLimiterConfigBuilder {
        TimeLimiterConfigBuilder::new()
    }

    /// A time limiter with a limit of `millis` milliseconds.
    pub fn millis(millis: u64) -> Self {
        Self::builder().timeout_millis(millis).build()
    }

    /// A time limiter with a limit of `secs` seconds.
    pub fn secs(secs: u64) -> Self {
        Self::builder().timeout_secs(secs).build()
    }

    pub(crate) fn new(config: TimeLimiterConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configured limit.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Pure check: would an operation expected to take `estimated` exceed
    /// the limit? Makes no call and starts no timer.
    pub fn will_timeout(&self, estimated: Duration) -> bool {
        estimated > self.config.timeout
    }

    /// Runs `op` with a deadline of now plus the configured limit.
    ///
    /// Returns the operation's own result if it completes in time,
    /// [`TimeLimiterError::Timeout`] otherwise. On timeout the future is
    /// dropped; see the crate docs for the cancellation caveat.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, TimeLimiterError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = tokio::time::Instant::now();

        match tokio::time::timeout(self.config.timeout, op()).await {
            Ok(Ok(value)) => {
                self.config.event_listeners.emit(&TimeLimiterEvent::Success {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    duration: start.elapsed(),
                });

                #[cfg(feature = "metrics")]
                counter!("timelimiter_success_total", "timelimiter" => self.config.name.clone())
                    .increment(1);

                Ok(value)
            }
            Ok(Err(err)) => {
                self.config.event_listeners.emit(&TimeLimiterEvent::Error {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    duration: start.elapsed(),
                });

                #[cfg(feature = "metrics")]
                counter!("timelimiter_error_total", "timelimiter" => self.config.name.clone())
                    .increment(1);

                Err(TimeLimiterError::Operation(err))
            }
            Err(_) => {
                self.config.event_listeners.emit(&TimeLimiterEvent::Timeout {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    limit: self.config.timeout,
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    timelimiter = %self.config.name,
                    limit_ms = self.config.timeout.as_millis() as u64,
                    "operation timed out"
                );

                #[cfg(feature = "metrics")]
                counter!("timelimiter_timeout_total", "timelimiter" => self.config.name.clone())
                    .increment(1);

                Err(TimeLimiterError::Timeout {
                    limit: self.config.timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError;

    #[tokio::test(start_paused = true)]
    async fn fast_operation_passes_through() {
        let limiter = TimeLimiter::millis(100);
        let result = limiter.execute(|| async { Ok::<_, TestError>(5) }).await;
        assert_eq!(result, Ok(5));
    }

    #[tokio::test(start_paused = true)]
    async fn operation_error_passes_through() {
        let limiter = TimeLimiter::millis(100);
        let result = limiter.execute(|| async { Err::<(), _>(TestError) }).await;
        assert_eq!(result, Err(TimeLimiterError::Operation(TestError)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let limiter = TimeLimiter::millis(100);
        let result = limiter
            .execute(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, TestError>(5)
            })
            .await;
        assert_eq!(
            result,
            Err(TimeLimiterError::Timeout {
                limit: Duration::from_millis(100)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completion_at_the_limit_boundary_wins() {
        let limiter = TimeLimiter::millis(100);
        let result = limiter
            .execute(|| async {
                tokio::time::sleep(Duration::from_millis(99)).await;
                Ok::<_, TestError>("made it")
            })
            .await;
        assert_eq!(result, Ok("made it"));
    }

    #[test]
    fn will_timeout_compares_against_the_limit() {
        let limiter = TimeLimiter::millis(100);
        assert!(!limiter.will_timeout(Duration::from_millis(100)));
        assert!(limiter.will_timeout(Duration::from_millis(101)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_remaining_counts_down_to_zero() {
        let deadline = Deadline::after(Duration::from_millis(100));
        assert_eq!(deadline.remaining(), Duration::from_millis(100));
        assert!(!deadline.is_elapsed());

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(deadline.remaining(), Duration::from_millis(40));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert!(deadline.is_elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_listener_fires_with_the_limit() {
        let timeouts = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&timeouts);

        let limiter = TimeLimiter::builder()
            .timeout_millis(50)
            .on_timeout(move |limit| {
                assert_eq!(limit, Duration::from_millis(50));
                t.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let _ = limiter
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, TestError>(())
            })
            .await;

        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
    }
}
