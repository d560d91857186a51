//! Events emitted by the retry loop.

use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted during a retried execution.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A failed attempt will be retried after the given delay.
    Retry {
        /// Configured name of the retrier.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The attempt that just failed (1-based).
        attempt: u32,
        /// Delay before the next attempt.
        delay: Duration,
    },
    /// The operation succeeded.
    Success {
        /// Configured name of the retrier.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Total attempts made, including the successful one.
        attempts: u32,
    },
    /// All retries were used up; the last error is returned to the caller.
    Exhausted {
        /// Configured name of the retrier.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Total attempts made.
        attempts: u32,
    },
    /// The error did not match the retry predicate and was returned as-is.
    IgnoredError {
        /// Configured name of the retrier.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Success { pattern_name, .. }
            | RetryEvent::Exhausted { pattern_name, .. }
            | RetryEvent::IgnoredError { pattern_name, .. } => pattern_name,
        }
    }
}
