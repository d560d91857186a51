//! Error types for the time limiter.

use guardrail_core::GuardError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`TimeLimiter::execute`](crate::TimeLimiter::execute).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeLimiterError<E> {
    /// The limit elapsed before the operation completed. The abandoned
    /// operation may still be running; its eventual result is discarded.
    #[error("operation timed out after {limit:?}")]
    Timeout {
        /// The configured limit.
        limit: Duration,
    },

    /// The operation completed within the limit but failed with its own
    /// error.
    #[error("operation error: {0}")]
    Operation(E),
}

impl<E> TimeLimiterError<E> {
    /// Returns true if the limit elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout { .. })
    }

    /// Unwraps the operation's own error, if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            TimeLimiterError::Operation(e) => Some(e),
            TimeLimiterError::Timeout { .. } => None,
        }
    }
}

impl<E> From<TimeLimiterError<E>> for GuardError<E> {
    fn from(err: TimeLimiterError<E>) -> Self {
        match err {
            TimeLimiterError::Timeout { limit } => GuardError::Timeout { limit },
            TimeLimiterError::Operation(e) => GuardError::Operation(e),
        }
    }
}
