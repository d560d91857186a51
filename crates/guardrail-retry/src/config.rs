//! Retry configuration and builder.

use crate::backoff::{
    ExponentialBackoff, ExponentialJitterBackoff, FixedInterval, Immediate, IntervalFunction,
    LinearBackoff,
};
use crate::events::RetryEvent;
use crate::Retrier;
use guardrail_core::events::{EventListeners, FnListener};
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether an error is worth retrying.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Immutable configuration for a [`Retrier`].
pub struct RetryConfig<E> {
    pub(crate) max_retries: u32,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: Option<RetryPredicate<E>>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl<E> RetryConfig<E> {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<E> {
    max_retries: u32,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - max_retries: 3
    /// - backoff: exponential with 100ms initial delay
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            interval_fn: None,
            retry_predicate: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of retries after the initial attempt.
    ///
    /// `max_retries = 0` means the operation is attempted exactly once.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Uses the same delay between every attempt.
    pub fn fixed_delay(mut self, delay: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(delay)));
        self
    }

    /// Uses exponential backoff with default multiplier and cap.
    pub fn exponential_backoff(mut self, initial: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial)));
        self
    }

    /// Uses exponential backoff with full jitter.
    pub fn exponential_jitter(mut self, initial: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialJitterBackoff::new(initial)));
        self
    }

    /// Uses linearly increasing delays.
    pub fn linear_backoff(mut self, initial: Duration, step: Duration) -> Self {
        self.interval_fn = Some(Arc::new(LinearBackoff::new(initial, step)));
        self
    }

    /// Retries with no delay at all.
    pub fn immediate(mut self) -> Self {
        self.interval_fn = Some(Arc::new(Immediate));
        self
    }

    /// Uses a custom interval function.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Restricts retries to errors matching the predicate.
    ///
    /// Errors rejected by the predicate are returned to the caller
    /// immediately without further attempts.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets the instance name used in emitted events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each retry delay begins.
    ///
    /// Receives the failed attempt number (1-based) and the delay before the
    /// next attempt.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked when the operation succeeds.
    ///
    /// Receives the total number of attempts made.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when every retry has been used up.
    ///
    /// Receives the total number of attempts made.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the retrier.
    pub fn build(self) -> Retrier<E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_millis(100))));

        Retrier::new(RetryConfig {
            max_retries: self.max_retries,
            interval_fn,
            retry_predicate: self.retry_predicate,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
