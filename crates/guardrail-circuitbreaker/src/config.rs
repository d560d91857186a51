//! Circuit breaker configuration and builder.

use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use crate::CircuitBreaker;
use guardrail_core::clock::{SharedClock, SystemClock};
use guardrail_core::events::{EventListeners, FnListener};
use std::sync::Arc;
use std::time::Duration;

/// Immutable configuration for a [`CircuitBreaker`].
pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) success_threshold: u32,
    pub(crate) open_timeout_ms: u64,
    pub(crate) clock: SharedClock,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: u32,
    success_threshold: u32,
    open_timeout: Duration,
    clock: Option<SharedClock>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - failure_threshold: 5
    /// - success_threshold: 1
    /// - open_timeout: 30 seconds
    /// - clock: [`SystemClock`]
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            open_timeout: Duration::from_secs(30),
            clock: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Consecutive failures (while closed) that open the circuit.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is zero.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        assert!(threshold >= 1, "failure_threshold must be at least 1");
        self.failure_threshold = threshold;
        self
    }

    /// Consecutive half-open successes that close the circuit.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is zero.
    pub fn success_threshold(mut self, threshold: u32) -> Self {
        assert!(threshold >= 1, "success_threshold must be at least 1");
        self.success_threshold = threshold;
        self
    }

    /// How long the circuit stays open before admitting a probe.
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Injects the time source; tests use a manually driven clock.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the instance name used in emitted events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked on every state transition.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is rejected.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the circuit breaker.
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            open_timeout_ms: self.open_timeout.as_millis() as u64,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new()) as SharedClock),
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
