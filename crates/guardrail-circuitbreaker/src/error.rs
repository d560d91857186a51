use guardrail_core::GuardError;
use thiserror::Error;

/// Errors returned by [`CircuitBreaker::execute`](crate::CircuitBreaker::execute).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit is open; call not permitted")]
    OpenCircuit,

    /// The operation was invoked and failed with its own error.
    #[error("operation error: {0}")]
    Operation(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the circuit rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit)
    }

    /// Unwraps the operation's own error, if present.
    pub fn into_operation(self) -> Option<E> {
        match self {
            CircuitBreakerError::Operation(e) => Some(e),
            CircuitBreakerError::OpenCircuit => None,
        }
    }
}

impl<E> From<CircuitBreakerError<E>> for GuardError<E> {
    fn from(err: CircuitBreakerError<E>) -> Self {
        match err {
            CircuitBreakerError::OpenCircuit => GuardError::CircuitOpen,
            CircuitBreakerError::Operation(e) => GuardError::Operation(e),
        }
    }
}
