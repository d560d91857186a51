//! Time limiter configuration and builder.

use crate::events::TimeLimiterEvent;
use crate::TimeLimiter;
use guardrail_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Immutable configuration for a [`TimeLimiter`].
pub struct TimeLimiterConfig {
    pub(crate) timeout: Duration,
    pub(crate) event_listeners: EventListeners<TimeLimiterEvent>,
    pub(crate) name: String,
}

impl TimeLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeLimiterConfigBuilder {
        TimeLimiterConfigBuilder::new()
    }
}

/// Builder for [`TimeLimiterConfig`].
pub struct TimeLimiterConfigBuilder {
    timeout: Duration,
    event_listeners: EventListeners<TimeLimiterEvent>,
    name: String,
}

impl Default for TimeLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeLimiterConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - timeout: 1 second
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the limit as a [`Duration`].
    pub fn timeout_duration(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the limit in milliseconds.
    pub fn timeout_millis(self, millis: u64) -> Self {
        self.timeout_duration(Duration::from_millis(millis))
    }

    /// Sets the limit in seconds.
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout_duration(Duration::from_secs(secs))
    }

    /// Sets the instance name used in emitted events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when an operation completes in time,
    /// with how long it ran.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Success { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when an operation fails in time, with
    /// how long it ran.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Error { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback invoked when the limit elapses, with the
    /// configured limit.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let TimeLimiterEvent::Timeout { limit, .. } = event {
                f(*limit);
            }
        }));
        self
    }

    /// Builds the time limiter.
    pub fn build(self) -> TimeLimiter {
        TimeLimiter::new(TimeLimiterConfig {
            timeout: self.timeout,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let limiter = TimeLimiterConfig::builder().build();
        assert_eq!(limiter.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn millis_and_secs_are_equivalent() {
        let a = TimeLimiterConfig::builder().timeout_millis(2_000).build();
        let b = TimeLimiterConfig::builder().timeout_secs(2).build();
        assert_eq!(a.timeout(), b.timeout());
    }
}
