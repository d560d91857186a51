//! The breaker's state machine, guarded by the mutex in the outer
//! [`CircuitBreaker`](crate::CircuitBreaker).

use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::counter;

/// The state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Calls flow through; consecutive failures are counted.
    Closed = 0,
    /// Calls are rejected until the open timeout elapses.
    Open = 1,
    /// A limited number of probe calls are admitted to test recovery.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Point-in-time snapshot of the breaker's counters and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitStats {
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures observed while closed.
    pub consecutive_failures: u32,
    /// Consecutive successes observed while half-open.
    pub consecutive_successes: u32,
    /// Clock reading when the breaker last opened; `None` while closed.
    pub opened_at_ms: Option<u64>,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at_ms: Option<u64>,
    // Clock reading when the current half-open probe was admitted. A probe
    // whose caller never reports back (the future was dropped mid-flight)
    // stops blocking admission once another `open_timeout` has elapsed.
    probe_started_ms: Option<u64>,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at_ms: None,
            probe_started_ms: None,
        }
    }

    pub(crate) fn stats(&self) -> CircuitStats {
        CircuitStats {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            consecutive_successes: self.consecutive_successes,
            opened_at_ms: self.opened_at_ms,
        }
    }

    /// Decides whether a call may proceed, performing the open → half-open
    /// transition when the cooldown has elapsed.
    ///
    /// Runs under the owning mutex, so exactly one caller wins the
    /// transition even when several query simultaneously.
    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig, now_ms: u64) -> bool {
        match self.state {
            CircuitState::Closed => {
                self.emit_permitted(config);
                true
            }
            CircuitState::Open => {
                let opened_at = self.opened_at_ms.unwrap_or(now_ms);
                if now_ms.saturating_sub(opened_at) >= config.open_timeout_ms {
                    self.transition_to(CircuitState::HalfOpen, config, now_ms);
                    self.probe_started_ms = Some(now_ms);
                    self.emit_permitted(config);
                    true
                } else {
                    self.emit_rejected(config);
                    false
                }
            }
            CircuitState::HalfOpen => {
                let probe_active = self
                    .probe_started_ms
                    .is_some_and(|started| now_ms.saturating_sub(started) < config.open_timeout_ms);
                if probe_active {
                    self.emit_rejected(config);
                    false
                } else {
                    self.probe_started_ms = Some(now_ms);
                    self.emit_permitted(config);
                    true
                }
            }
        }
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig, now_ms: u64) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                self.probe_started_ms = None;
                self.consecutive_successes += 1;
                if self.consecutive_successes >= config.success_threshold {
                    self.transition_to(CircuitState::Closed, config, now_ms);
                }
            }
            // A call admitted before the breaker opened may report back late.
            CircuitState::Open => {}
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig, now_ms: u64) {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= config.failure_threshold {
                    self.transition_to(CircuitState::Open, config, now_ms);
                }
            }
            CircuitState::HalfOpen => {
                self.probe_started_ms = None;
                self.transition_to(CircuitState::Open, config, now_ms);
            }
            CircuitState::Open => {}
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }

    /// Forces the breaker closed and zeroes every counter, from any state.
    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig, now_ms: u64) {
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.probe_started_ms = None;
        self.opened_at_ms = None;
        self.transition_to(CircuitState::Closed, config, now_ms);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig, now_ms: u64) {
        if self.state == state {
            return;
        }

        let from_state = self.state;
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(
            circuitbreaker = %config.name,
            from = ?from_state,
            to = ?state,
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_transitions_total",
            "circuitbreaker" => config.name.clone(),
            "to" => match state {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            }
        )
        .increment(1);

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.consecutive_failures = 0;
        self.consecutive_successes = 0;
        self.probe_started_ms = None;
        self.opened_at_ms = match state {
            CircuitState::Open => Some(now_ms),
            CircuitState::HalfOpen => self.opened_at_ms,
            CircuitState::Closed => None,
        };
    }

    fn emit_permitted(&self, config: &CircuitBreakerConfig) {
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });
    }

    fn emit_rejected(&self, config: &CircuitBreakerConfig) {
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::CallRejected {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_rejected_total", "circuitbreaker" => config.name.clone())
            .increment(1);
    }
}
