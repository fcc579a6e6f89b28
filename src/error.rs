//! Error type returned by throttled calls.
//!
//! [`ThrottleError`] separates failures of the wrapped operation itself from
//! failures of the throttling machinery:
//!
//! - [`ThrottleError::Operation`]: the operation failed; the value is passed through untouched.
//! - [`ThrottleError::Usage`]: the call could not be driven (misconfiguration).
//! - [`ThrottleError::Panicked`]: the operation panicked while running.
//! - [`ThrottleError::Abandoned`]: the running call was dropped before it settled.
//!
//! Every variant is local to one call. None of them leaves the controller in a
//! bad state: the call's slot is released and queued work keeps draining.

use std::borrow::Cow;

use thiserror::Error;

/// # Errors produced by a throttled call.
///
/// `E` is the error type of the wrapped operation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ThrottleError<E> {
    /// The wrapped operation failed with this error.
    #[error("{0}")]
    Operation(E),

    /// The call was misconfigured and could not produce a result.
    ///
    /// Raised when a call is made outside a tokio runtime, or when a
    /// callback-style operation drops its completion callback without invoking it.
    #[error("usage error: {reason}")]
    Usage {
        /// What was wrong with the call.
        reason: Cow<'static, str>,
    },

    /// The wrapped operation panicked.
    #[error("operation panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The call was dropped while running (e.g. the runtime shut down).
    #[error("call abandoned before settling")]
    Abandoned,
}

impl<E> ThrottleError<E> {
    /// Builds a [`ThrottleError::Usage`] with the given reason.
    pub fn usage(reason: impl Into<Cow<'static, str>>) -> Self {
        ThrottleError::Usage {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use throttle_queue::ThrottleError;
    ///
    /// let err: ThrottleError<&str> = ThrottleError::usage("no runtime");
    /// assert_eq!(err.as_label(), "throttle_usage");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ThrottleError::Operation(_) => "operation_failed",
            ThrottleError::Usage { .. } => "throttle_usage",
            ThrottleError::Panicked { .. } => "operation_panicked",
            ThrottleError::Abandoned => "call_abandoned",
        }
    }

    /// True for [`ThrottleError::Usage`].
    pub fn is_usage(&self) -> bool {
        matches!(self, ThrottleError::Usage { .. })
    }

    /// True for [`ThrottleError::Operation`].
    pub fn is_operation(&self) -> bool {
        matches!(self, ThrottleError::Operation(_))
    }

    /// Returns the operation's own error, if that is what failed.
    ///
    /// # Example
    /// ```
    /// use throttle_queue::ThrottleError;
    ///
    /// let err = ThrottleError::Operation("disk full");
    /// assert_eq!(err.into_operation(), Some("disk full"));
    /// ```
    pub fn into_operation(self) -> Option<E> {
        match self {
            ThrottleError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Turns a panic payload into [`ThrottleError::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        ThrottleError::Panicked {
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Extracts the text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<E: std::fmt::Display> ThrottleError<E> {
    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ThrottleError::Operation(e) => format!("error: {e}"),
            ThrottleError::Usage { reason } => format!("usage: {reason}"),
            ThrottleError::Panicked { message } => format!("panic: {message}"),
            ThrottleError::Abandoned => "abandoned".to_string(),
        }
    }
}
