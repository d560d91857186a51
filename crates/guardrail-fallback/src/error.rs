//! Error types for the fallback wrapper.

use guardrail_core::GuardError;
use thiserror::Error;

/// Errors returned when the primary operation failed and the fallback could
/// not rescue the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackError<E> {
    /// No substitute result exists: the cache was never populated, or every
    /// link of a chain was exhausted without one to try.
    #[error("every fallback was exhausted")]
    Exhausted,

    /// The fallback path was tried and failed with its own error. Holds the
    /// last error observed.
    #[error("fallback failed: {0}")]
    FallbackFailed(E),
}

impl<E> FallbackError<E> {
    /// Returns true if no fallback result existed at all.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FallbackError::Exhausted)
    }

    /// Unwraps the fallback path's own error, if present.
    pub fn into_fallback_error(self) -> Option<E> {
        match self {
            FallbackError::FallbackFailed(e) => Some(e),
            FallbackError::Exhausted => None,
        }
    }
}

impl<E> From<FallbackError<E>> for GuardError<E> {
    fn from(err: FallbackError<E>) -> Self {
        match err {
            FallbackError::Exhausted => GuardError::FallbackExhausted,
            FallbackError::FallbackFailed(e) => GuardError::Operation(e),
        }
    }
}
