//! # Function-backed operation (`OperationFn`)
//!
//! [`OperationFn`] wraps a closure `F: Fn(A) -> Fut`, producing a fresh future
//! per invocation. Errors returned by the closure reach the caller as
//! [`ThrottleError::Operation`] with the value untouched.
//!
//! ## Example
//! ```rust
//! use throttle_queue::{Operation, OperationFn};
//!
//! let op = OperationFn::new(|path: String| async move {
//!     Ok::<_, std::io::Error>(path.len())
//! });
//! let _deferred = op.invoke("/tmp/a".to_string());
//! ```

use std::future::Future;

use futures::TryFutureExt;

use crate::error::ThrottleError;
use crate::operations::operation::{BoxDeferred, Operation};

/// Function-backed operation implementation.
#[derive(Debug, Clone)]
pub struct OperationFn<F> {
    f: F,
}

impl<F> OperationFn<F> {
    /// Creates a new function-backed operation.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<A, F, Fut, T, E> Operation<A> for OperationFn<F>
where
    F: Fn(A) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, args: A) -> BoxDeferred<T, E> {
        let fut = (self.f)(args);
        Box::pin(fut.map_err(ThrottleError::Operation))
    }
}
