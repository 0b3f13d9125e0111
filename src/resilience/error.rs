//! Errors surfaced by guarded calls.

use std::fmt;
use thiserror::Error;

/// The breaker refused to attempt the call.
///
/// Produced locally without touching the dependency, so it is cheap to
/// return and never carries an underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit open for `{dependency}`; retry after {retry_after_ms} ms")]
pub struct BreakerOpenError {
    /// Name of the protected dependency.
    pub dependency: String,
    /// Milliseconds until the breaker will admit a probe.
    pub retry_after_ms: u64,
}

/// Outcome of a call that went through a circuit breaker.
///
/// `Operation` holds the wrapped operation's own error untouched, so callers
/// can still match on its cause (rate limit vs server error, ...).
#[derive(Debug)]
pub enum CallError<E> {
    /// Rejected without invoking the operation.
    Open(BreakerOpenError),
    /// The operation ran and failed.
    Operation(E),
}

impl<E> CallError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CallError::Open(_))
    }

    /// Remaining cooldown when the breaker rejected the call.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            CallError::Open(e) => Some(e.retry_after_ms),
            CallError::Operation(_) => None,
        }
    }

    pub fn operation_error(&self) -> Option<&E> {
        match self {
            CallError::Operation(e) => Some(e),
            CallError::Open(_) => None,
        }
    }

    pub fn into_operation(self) -> Option<E> {
        match self {
            CallError::Operation(e) => Some(e),
            CallError::Open(_) => None,
        }
    }
}

impl<E> From<BreakerOpenError> for CallError<E> {
    fn from(err: BreakerOpenError) -> Self {
        CallError::Open(err)
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Open(e) => write!(f, "{}", e),
            CallError::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for CallError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Open(e) => Some(e),
            CallError::Operation(e) => Some(e),
        }
    }
}
