//! Error types for the bulkhead.

use guardrail_core::GuardError;
use thiserror::Error;

/// Why an admission request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Capacity (and, under the wait policy, the waiting queue) is exhausted.
    #[error("bulkhead is full: max concurrent calls ({max_concurrent}) reached")]
    Full {
        /// The configured concurrency limit.
        max_concurrent: usize,
    },

    /// A slot did not free up within the configured wait.
    #[error("timed out waiting for a bulkhead slot")]
    WaitTimeout,
}

/// Errors returned by [`Bulkhead::execute`](crate::Bulkhead::execute).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkheadError<E> {
    /// The bulkhead turned the call away without invoking the operation.
    #[error(transparent)]
    Rejected(#[from] AcquireError),

    /// The operation was invoked and failed with its own error.
    #[error("operation error: {0}")]
    Operation(E),
}

impl<E> BulkheadError<E> {
    /// Returns true if the bulkhead rejected the call (full or wait expired).
    pub fn is_rejected(&self) -> bool {
        matches!(self, BulkheadError::Rejected(_))
    }

    /// Returns true if the rejection was an expired wait.
    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, BulkheadError::Rejected(AcquireError::WaitTimeout))
    }

    /// Unwraps the operation's own error, if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BulkheadError::Operation(e) => Some(e),
            BulkheadError::Rejected(_) => None,
        }
    }
}

impl<E> From<AcquireError> for GuardError<E> {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Full { max_concurrent } => GuardError::BulkheadRejected { max_concurrent },
            AcquireError::WaitTimeout => GuardError::BulkheadWaitTimeout,
        }
    }
}

impl<E> From<BulkheadError<E>> for GuardError<E> {
    fn from(err: BulkheadError<E>) -> Self {
        match err {
            BulkheadError::Rejected(e) => e.into(),
            BulkheadError::Operation(e) => GuardError::Operation(e),
        }
    }
}
