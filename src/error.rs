//! Error types for the circuit breaker library.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Result type for guarded calls.
pub type BreakerResult<T, E> = Result<T, BreakerError<E>>;

/// Error returned by [`CircuitBreaker::call`](crate::CircuitBreaker::call).
#[derive(Debug)]
pub enum BreakerError<E> {
    /// The circuit is open and the cooldown has not elapsed; the operation was not invoked.
    Open,

    /// The operation did not complete within the configured call timeout.
    Timeout(Duration),

    /// The underlying operation failed.
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Returns true if the call was rejected without invoking the operation.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }

    /// Returns true if the call exceeded the call timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BreakerError::Timeout(_))
    }

    /// Returns true if the operation itself produced the error.
    pub fn is_operation(&self) -> bool {
        matches!(self, BreakerError::Operation(_))
    }

    /// Extracts the operation error, if any.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> Display for BreakerError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BreakerError::Open => write!(f, "Circuit is open, call rejected"),
            BreakerError::Timeout(limit) => write!(f, "Call timed out after {:?}", limit),
            BreakerError::Operation(e) => write!(f, "Operation error: {}", e),
        }
    }
}

impl<E: Error + 'static> Error for BreakerError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BreakerError::Operation(e) => Some(e),
            BreakerError::Open | BreakerError::Timeout(_) => None,
        }
    }
}
