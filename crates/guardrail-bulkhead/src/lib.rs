//! Bulkhead admission control for async operations.
//!
//! A bulkhead caps how many calls may be in flight against a dependency at
//! once, so one overloaded downstream cannot soak up every caller's tasks.
//! Admission is semaphore-based; under the [`Wait`](RejectionPolicy::Wait)
//! policy a bounded FIFO queue of callers may block (up to a configured
//! wait) for a freed slot, otherwise calls over capacity are rejected
//! immediately.
//!
//! Slots are released through an RAII permit, so a panicking or cancelled
//! operation can never leak capacity.
//!
//! # Examples
//!
//! ```
//! use guardrail_bulkhead::{Bulkhead, RejectionPolicy};
//! use std::time::Duration;
//!
//! # #[derive(Debug, Clone)]
//! # struct UpstreamError;
//! # async fn example() {
//! let bulkhead = Bulkhead::builder()
//!     .max_concurrent(10)
//!     .rejection_policy(RejectionPolicy::Wait)
//!     .max_waiting(32)
//!     .max_wait(Duration::from_secs(2))
//!     .name("search-index")
//!     .build();
//!
//! let result = bulkhead
//!     .execute(|| async { Ok::<_, UpstreamError>("hit") })
//!     .await;
//! assert!(result.is_ok());
//! # }
//! ```

mod config;
mod error;
mod events;

pub use config::{BulkheadConfig, BulkheadConfigBuilder, RejectionPolicy};
pub use error::{AcquireError, BulkheadError};
pub use events::BulkheadEvent;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Point-in-time snapshot of the bulkhead's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkheadStats {
    /// Calls currently holding a slot.
    pub current_concurrent: usize,
    /// Callers currently queued for a slot.
    pub current_waiting: usize,
    /// The configured concurrency limit.
    pub max_concurrent: usize,
}

/// An admitted call's slot. Dropping it releases the slot and wakes the
/// longest-waiting queued caller, if any.
#[derive(Debug)]
pub struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
}

/// Shared, thread-safe admission control over a bounded concurrency budget.
///
/// One instance is shared by every caller of a logical downstream
/// dependency.
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    config: Arc<BulkheadConfig>,
}

// Decrements the waiting counter even if the waiting future is cancelled.
struct WaitGuard(Arc<AtomicUsize>);

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Bulkhead {
    /// Creates a new configuration builder.
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }

    pub(crate) fn new(config: BulkheadConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            semaphore,
            waiting: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
        }
    }

    /// Current occupancy. Counters are read individually, so a snapshot
    /// taken under contention may be momentarily stale but never torn.
    pub fn stats(&self) -> BulkheadStats {
        BulkheadStats {
            current_concurrent: self.config.max_concurrent - self.semaphore.available_permits(),
            current_waiting: self.waiting.load(Ordering::Acquire),
            max_concurrent: self.config.max_concurrent,
        }
    }

    /// Tries to take a slot without ever waiting, regardless of the
    /// configured rejection policy.
    pub fn try_acquire(&self) -> Result<BulkheadPermit, AcquireError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.emit_permitted();
                Ok(BulkheadPermit { _permit: permit })
            }
            Err(_) => {
                self.emit_rejected();
                Err(AcquireError::Full {
                    max_concurrent: self.config.max_concurrent,
                })
            }
        }
    }

    /// Takes a slot, honoring the configured rejection policy.
    ///
    /// Under [`RejectionPolicy::Wait`] the caller joins a FIFO queue (if it
    /// is not already `max_waiting` deep) and blocks up to `max_wait` for a
    /// freed slot.
    pub async fn acquire(&self) -> Result<BulkheadPermit, AcquireError> {
        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            self.emit_permitted();
            return Ok(BulkheadPermit { _permit: permit });
        }

        if self.config.rejection_policy == RejectionPolicy::FailFast {
            self.emit_rejected();
            return Err(AcquireError::Full {
                max_concurrent: self.config.max_concurrent,
            });
        }

        // Reserve a waiting-queue position; the queue itself is the
        // semaphore's FIFO waiter list.
        let max_waiting = self.config.max_waiting;
        let reserved = self
            .waiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |waiting| {
                (waiting < max_waiting).then_some(waiting + 1)
            });
        if reserved.is_err() {
            self.emit_rejected();
            return Err(AcquireError::Full {
                max_concurrent: self.config.max_concurrent,
            });
        }
        let _waiting = WaitGuard(Arc::clone(&self.waiting));

        match tokio::time::timeout(
            self.config.max_wait,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => {
                self.emit_permitted();
                Ok(BulkheadPermit { _permit: permit })
            }
            // The semaphore is never closed.
            Ok(Err(_)) => {
                self.emit_rejected();
                Err(AcquireError::Full {
                    max_concurrent: self.config.max_concurrent,
                })
            }
            Err(_) => {
                self.emit_rejected();

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    bulkhead = %self.config.name,
                    max_wait_ms = self.config.max_wait.as_millis() as u64,
                    "wait for a slot expired"
                );

                Err(AcquireError::WaitTimeout)
            }
        }
    }

    /// Runs `op` inside the bulkhead.
    ///
    /// On rejection the operation is never invoked. On admission the slot is
    /// released on every exit path, including panics, before the result is
    /// returned.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, BulkheadError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire().await?;
        let start = Instant::now();

        let result = op().await;
        drop(permit);

        let duration = start.elapsed();
        match &result {
            Ok(_) => {
                self.config.event_listeners.emit(&BulkheadEvent::CallFinished {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });
            }
            Err(_) => {
                self.config.event_listeners.emit(&BulkheadEvent::CallFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });
            }
        }

        result.map_err(BulkheadError::Operation)
    }

    fn emit_permitted(&self) {
        let concurrent_calls = self.config.max_concurrent - self.semaphore.available_permits();
        self.config
            .event_listeners
            .emit(&BulkheadEvent::CallPermitted {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                concurrent_calls,
            });

        #[cfg(feature = "metrics")]
        {
            counter!("bulkhead_calls_permitted_total", "bulkhead" => self.config.name.clone())
                .increment(1);
            gauge!("bulkhead_concurrent_calls", "bulkhead" => self.config.name.clone())
                .set(concurrent_calls as f64);
        }
    }

    fn emit_rejected(&self) {
        self.config
            .event_listeners
            .emit(&BulkheadEvent::CallRejected {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                max_concurrent: self.config.max_concurrent,
            });

        #[cfg(feature = "metrics")]
        counter!("bulkhead_calls_rejected_total", "bulkhead" => self.config.name.clone())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError;

    #[test]
    fn fail_fast_rejects_at_capacity_and_recovers_on_release() {
        let bulkhead = Bulkhead::builder().max_concurrent(2).build();

        let first = bulkhead.try_acquire().expect("slot 1");
        let _second = bulkhead.try_acquire().expect("slot 2");
        assert_eq!(bulkhead.stats().current_concurrent, 2);

        assert_eq!(
            bulkhead.try_acquire().unwrap_err(),
            AcquireError::Full { max_concurrent: 2 }
        );

        drop(first);
        assert!(bulkhead.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn fail_fast_acquire_never_waits() {
        let bulkhead = Bulkhead::builder().max_concurrent(1).build();
        let _held = bulkhead.acquire().await.expect("slot");

        assert_eq!(
            bulkhead.acquire().await.unwrap_err(),
            AcquireError::Full { max_concurrent: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_caller_gets_the_freed_slot() {
        let bulkhead = Arc::new(
            Bulkhead::builder()
                .max_concurrent(1)
                .rejection_policy(RejectionPolicy::Wait)
                .max_waiting(1)
                .max_wait(Duration::from_secs(1))
                .build(),
        );

        let held = bulkhead.acquire().await.expect("slot");

        let waiter = {
            let bulkhead = Arc::clone(&bulkhead);
            tokio::spawn(async move { bulkhead.acquire().await.is_ok() })
        };
        tokio::task::yield_now().await;
        assert_eq!(bulkhead.stats().current_waiting, 1);

        drop(held);
        assert!(waiter.await.unwrap());
        assert_eq!(bulkhead.stats().current_waiting, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_wait_is_reported_as_timeout() {
        let bulkhead = Bulkhead::builder()
            .max_concurrent(1)
            .rejection_policy(RejectionPolicy::Wait)
            .max_waiting(4)
            .max_wait(Duration::from_millis(100))
            .build();

        let _held = bulkhead.acquire().await.expect("slot");
        assert_eq!(
            bulkhead.acquire().await.unwrap_err(),
            AcquireError::WaitTimeout
        );
        assert_eq!(bulkhead.stats().current_waiting, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn full_waiting_queue_rejects_immediately() {
        let bulkhead = Arc::new(
            Bulkhead::builder()
                .max_concurrent(1)
                .rejection_policy(RejectionPolicy::Wait)
                .max_waiting(1)
                .max_wait(Duration::from_secs(10))
                .build(),
        );

        let _held = bulkhead.acquire().await.expect("slot");

        let queued = {
            let bulkhead = Arc::clone(&bulkhead);
            tokio::spawn(async move { bulkhead.acquire().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(bulkhead.stats().current_waiting, 1);

        // Queue is full; this caller is rejected without waiting.
        assert_eq!(
            bulkhead.acquire().await.unwrap_err(),
            AcquireError::Full { max_concurrent: 1 }
        );

        queued.abort();
        let _ = queued.await;
        // An abandoned waiter gives its queue position back.
        assert_eq!(bulkhead.stats().current_waiting, 0);
    }

    #[tokio::test]
    async fn execute_releases_the_slot_on_success_and_error() {
        let bulkhead = Bulkhead::builder().max_concurrent(1).build();

        let ok = bulkhead.execute(|| async { Ok::<_, TestError>(7) }).await;
        assert_eq!(ok, Ok(7));
        assert_eq!(bulkhead.stats().current_concurrent, 0);

        let err = bulkhead
            .execute(|| async { Err::<(), _>(TestError) })
            .await;
        assert_eq!(err, Err(BulkheadError::Operation(TestError)));
        assert_eq!(bulkhead.stats().current_concurrent, 0);
    }

    #[tokio::test]
    async fn execute_rejection_does_not_invoke_the_operation() {
        let bulkhead = Bulkhead::builder().max_concurrent(1).build();
        let _held = bulkhead.try_acquire().expect("slot");

        let invoked = Arc::new(AtomicUsize::new(0));
        let i = Arc::clone(&invoked);
        let result = bulkhead
            .execute(|| {
                let i = Arc::clone(&i);
                async move {
                    i.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(())
                }
            })
            .await;

        assert!(matches!(result, Err(BulkheadError::Rejected(_))));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_operation_still_releases_its_slot() {
        let bulkhead = Arc::new(Bulkhead::builder().max_concurrent(1).build());

        let task = {
            let bulkhead = Arc::clone(&bulkhead);
            tokio::spawn(async move {
                let _: Result<(), BulkheadError<TestError>> = bulkhead
                    .execute(|| async { panic!("operation bug") })
                    .await;
            })
        };
        assert!(task.await.is_err());

        assert_eq!(bulkhead.stats().current_concurrent, 0);
        assert!(bulkhead.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn rejection_listener_fires() {
        let rejections = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&rejections);

        let bulkhead = Bulkhead::builder()
            .max_concurrent(1)
            .on_call_rejected(move |_| {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let _held = bulkhead.try_acquire().expect("slot");
        let _ = bulkhead.try_acquire();
        let _ = bulkhead.try_acquire();

        assert_eq!(rejections.load(Ordering::SeqCst), 2);
    }
}
