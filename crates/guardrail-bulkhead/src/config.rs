//! Bulkhead configuration and builder.

use crate::events::BulkheadEvent;
use crate::Bulkhead;
use guardrail_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// What to do with a call that arrives while every slot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Reject immediately.
    FailFast,
    /// Queue (FIFO) up to `max_waiting` callers for at most `max_wait`.
    Wait,
}

/// Immutable configuration for a [`Bulkhead`].
pub struct BulkheadConfig {
    pub(crate) max_concurrent: usize,
    pub(crate) max_waiting: usize,
    pub(crate) max_wait: Duration,
    pub(crate) rejection_policy: RejectionPolicy,
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
    pub(crate) name: String,
}

impl BulkheadConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }
}

/// Builder for [`BulkheadConfig`].
pub struct BulkheadConfigBuilder {
    max_concurrent: usize,
    max_waiting: usize,
    max_wait: Duration,
    rejection_policy: RejectionPolicy,
    event_listeners: EventListeners<BulkheadEvent>,
    name: String,
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkheadConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - max_concurrent: 10
    /// - rejection_policy: [`RejectionPolicy::FailFast`]
    /// - max_waiting: 0, max_wait: 0 (only relevant under the wait policy)
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_concurrent: 10,
            max_waiting: 0,
            max_wait: Duration::ZERO,
            rejection_policy: RejectionPolicy::FailFast,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Maximum number of concurrently admitted calls.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is zero.
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        assert!(max_concurrent >= 1, "max_concurrent must be at least 1");
        self.max_concurrent = max_concurrent;
        self
    }

    /// Maximum number of callers queued for a slot under the wait policy.
    pub fn max_waiting(mut self, max_waiting: usize) -> Self {
        self.max_waiting = max_waiting;
        self
    }

    /// How long a queued caller waits for a slot before being rejected.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sets the rejection policy.
    pub fn rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.rejection_policy = policy;
        self
    }

    /// Sets the instance name used in emitted events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a call is admitted, with the
    /// in-flight count after admission.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallPermitted {
                concurrent_calls, ..
            } = event
            {
                f(*concurrent_calls);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is rejected, with the
    /// configured concurrency limit.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallRejected { max_concurrent, .. } = event {
                f(*max_concurrent);
            }
        }));
        self
    }

    /// Registers a callback invoked when an admitted call releases its slot,
    /// with the time the slot was held.
    pub fn on_call_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallFinished { duration, .. }
            | BulkheadEvent::CallFailed { duration, .. } = event
            {
                f(*duration);
            }
        }));
        self
    }

    /// Builds the bulkhead.
    pub fn build(self) -> Bulkhead {
        Bulkhead::new(BulkheadConfig {
            max_concurrent: self.max_concurrent,
            max_waiting: self.max_waiting,
            max_wait: self.max_wait,
            rejection_policy: self.rejection_policy,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
