//! Events emitted by the bulkhead.

use guardrail_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted as calls pass through (or are turned away from) the
/// bulkhead.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A call was admitted.
    CallPermitted {
        /// Configured name of the bulkhead.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Calls in flight after this admission.
        concurrent_calls: usize,
    },
    /// A call was rejected (capacity exhausted or wait expired).
    CallRejected {
        /// Configured name of the bulkhead.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// The configured concurrency limit.
        max_concurrent: usize,
    },
    /// An admitted call finished successfully.
    CallFinished {
        /// Configured name of the bulkhead.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Time the call held its slot.
        duration: Duration,
    },
    /// An admitted call finished with an error.
    CallFailed {
        /// Configured name of the bulkhead.
        pattern_name: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Time the call held its slot.
        duration: Duration,
    },
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. }
            | BulkheadEvent::CallRejected { timestamp, .. }
            | BulkheadEvent::CallFinished { timestamp, .. }
            | BulkheadEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { pattern_name, .. }
            | BulkheadEvent::CallRejected { pattern_name, .. }
            | BulkheadEvent::CallFinished { pattern_name, .. }
            | BulkheadEvent::CallFailed { pattern_name, .. } => pattern_name,
        }
    }
}
