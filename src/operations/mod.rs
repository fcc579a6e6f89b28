//! # Operations that can be throttled.
//!
//! This module provides the operation-side types:
//! - [`Operation`] - trait for anything that turns arguments into a deferred result
//! - [`OperationFn`] - closure-backed implementation for `Fn(A) -> impl Future`
//! - [`OperationRef`] - shared reference to an operation (`Arc<dyn Operation>`)
//! - [`CallbackFn`] / [`adapt`] - adapter for callback-style operations
//! - [`Callback`] / [`Outcome`] - the completion handle and what it resolves to

mod callback;
mod operation;
mod operation_fn;

pub use callback::{Callback, CallbackFn, Outcome, adapt};
pub use operation::{BoxDeferred, Operation, OperationRef};
pub use operation_fn::OperationFn;
