//! Events emitted by the fallback wrapper.

use guardrail_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted as calls resolve through the primary path or a fallback.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The primary operation succeeded; no fallback was consulted.
    PrimarySucceeded {
        /// Configured name of the fallback wrapper.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// The primary operation failed and the fallback strategy supplied a
    /// substitute result.
    FallbackApplied {
        /// Configured name of the fallback wrapper.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
    /// The primary operation failed and the fallback strategy could not
    /// supply a result either.
    FallbackFailed {
        /// Configured name of the fallback wrapper.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::PrimarySucceeded { .. } => "primary_succeeded",
            FallbackEvent::FallbackApplied { .. } => "fallback_applied",
            FallbackEvent::FallbackFailed { .. } => "fallback_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::PrimarySucceeded { timestamp, .. }
            | FallbackEvent::FallbackApplied { timestamp, .. }
            | FallbackEvent::FallbackFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            FallbackEvent::PrimarySucceeded { pattern_name, .. }
            | FallbackEvent::FallbackApplied { pattern_name, .. }
            | FallbackEvent::FallbackFailed { pattern_name, .. } => pattern_name,
        }
    }
}
