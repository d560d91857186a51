//! Events emitted by the time limiter.

use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted as operations complete (or fail to) under the limit.
#[derive(Debug, Clone)]
pub enum TimeLimiterEvent {
    /// The operation completed successfully within the limit.
    Success {
        /// Configured name of the time limiter.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the operation ran.
        duration: Duration,
    },
    /// The operation completed with its own error within the limit.
    Error {
        /// Configured name of the time limiter.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// How long the operation ran.
        duration: Duration,
    },
    /// The limit elapsed before the operation completed.
    Timeout {
        /// Configured name of the time limiter.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The configured limit.
        limit: Duration,
    },
}

impl ResilienceEvent for TimeLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeLimiterEvent::Success { .. } => "success",
            TimeLimiterEvent::Error { .. } => "error",
            TimeLimiterEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeLimiterEvent::Success { timestamp, .. }
            | TimeLimiterEvent::Error { timestamp, .. }
            | TimeLimiterEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            TimeLimiterEvent::Success { pattern_name, .. }
            | TimeLimiterEvent::Error { pattern_name, .. }
            | TimeLimiterEvent::Timeout { pattern_name, .. } => pattern_name,
        }
    }
}
