//! Unified error type for composed guardrail pipelines.
//!
//! Each pattern crate defines its own error enum; [`GuardError`] folds them
//! all into a single type so a caller stacking several patterns does not have
//! to write conversion code between layers. The pattern crates provide `From`
//! implementations into `GuardError<E>` for their error types.

use std::time::Duration;
use thiserror::Error;

/// A single error type covering every way a guarded call can fail.
///
/// `E` is the wrapped operation's own domain error; it is carried through
/// verbatim in the [`Operation`](GuardError::Operation) variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError<E> {
    /// The wrapped operation itself failed.
    #[error("operation error: {0}")]
    Operation(E),

    /// The circuit breaker is open and rejected the call without invoking
    /// the operation.
    #[error("circuit is open; call not permitted")]
    CircuitOpen,

    /// The bulkhead was at capacity and rejected the call immediately.
    #[error("bulkhead is full: max concurrent calls ({max_concurrent}) reached")]
    BulkheadRejected {
        /// The configured concurrency limit.
        max_concurrent: usize,
    },

    /// The bulkhead wait for a free slot expired.
    #[error("timed out waiting for a bulkhead slot")]
    BulkheadWaitTimeout,

    /// The operation exceeded its deadline.
    #[error("operation exceeded the {limit:?} time limit")]
    Timeout {
        /// The configured time limit.
        limit: Duration,
    },

    /// Every fallback option was exhausted.
    #[error("fallback exhausted: no fallback value available")]
    FallbackExhausted,
}

impl<E> GuardError<E> {
    /// Returns true for the operation's own domain error.
    pub fn is_operation(&self) -> bool {
        matches!(self, GuardError::Operation(_))
    }

    /// Returns true if the circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, GuardError::CircuitOpen)
    }

    /// Returns true if the bulkhead rejected the call, with or without an
    /// expired wait.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            GuardError::BulkheadRejected { .. } | GuardError::BulkheadWaitTimeout
        )
    }

    /// Returns true if the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GuardError::Timeout { .. })
    }

    /// Returns true if every fallback option was exhausted.
    pub fn is_fallback_exhausted(&self) -> bool {
        matches!(self, GuardError::FallbackExhausted)
    }

    /// Borrows the operation error, if that is what this is.
    pub fn operation(&self) -> Option<&E> {
        match self {
            GuardError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Unwraps the operation error, if that is what this is.
    pub fn into_operation(self) -> Option<E> {
        match self {
            GuardError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the operation error type, leaving boundary errors untouched.
    pub fn map_operation<F, U>(self, f: F) -> GuardError<U>
    where
        F: FnOnce(E) -> U,
    {
        match self {
            GuardError::Operation(e) => GuardError::Operation(f(e)),
            GuardError::CircuitOpen => GuardError::CircuitOpen,
            GuardError::BulkheadRejected { max_concurrent } => {
                GuardError::BulkheadRejected { max_concurrent }
            }
            GuardError::BulkheadWaitTimeout => GuardError::BulkheadWaitTimeout,
            GuardError::Timeout { limit } => GuardError::Timeout { limit },
            GuardError::FallbackExhausted => GuardError::FallbackExhausted,
        }
    }
}
