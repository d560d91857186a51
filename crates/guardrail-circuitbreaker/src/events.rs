//! Events emitted by the circuit breaker.

use crate::circuit::CircuitState;
use guardrail_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted as the breaker records calls and changes state.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved between states.
    StateTransition {
        /// Configured name of the breaker.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State before the transition.
        from_state: CircuitState,
        /// State after the transition.
        to_state: CircuitState,
    },
    /// A call was admitted.
    CallPermitted {
        /// Configured name of the breaker.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State at the time of admission.
        state: CircuitState,
    },
    /// A call was rejected without invoking the operation.
    CallRejected {
        /// Configured name of the breaker.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// A success was recorded.
    SuccessRecorded {
        /// Configured name of the breaker.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State after the success was applied.
        state: CircuitState,
    },
    /// A failure was recorded.
    FailureRecorded {
        /// Configured name of the breaker.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State after the failure was applied.
        state: CircuitState,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { pattern_name, .. }
            | CircuitBreakerEvent::CallPermitted { pattern_name, .. }
            | CircuitBreakerEvent::CallRejected { pattern_name, .. }
            | CircuitBreakerEvent::SuccessRecorded { pattern_name, .. }
            | CircuitBreakerEvent::FailureRecorded { pattern_name, .. } => pattern_name,
        }
    }
}
