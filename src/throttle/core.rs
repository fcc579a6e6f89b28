use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::ThrottleConfig;
use crate::error::ThrottleError;
use crate::operations::OperationRef;

use super::{
    admission::Admission, builder::ThrottleBuilder, handle::CallHandle, pending::PendingCall,
    slot::Slot,
};

/// Operation wrapped with a concurrency ceiling and a FIFO wait queue.
///
/// At most `max_concurrent` invocations of the operation run at once. Calls
/// beyond that wait and are released strictly in arrival order as running
/// calls settle.
///
/// Cloning is cheap and shares the same queue and counters. Separately built
/// throttles never share capacity.
pub struct Throttle<A, T, E> {
    op: OperationRef<A, T, E>,
    admission: Arc<Admission>,
}

impl<A, T, E> Clone for Throttle<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            op: Arc::clone(&self.op),
            admission: Arc::clone(&self.admission),
        }
    }
}

impl Throttle<(), (), ()> {
    /// Starts building a throttle.
    ///
    /// ## Example
    /// ```rust
    /// use throttle_queue::{OperationFn, Throttle, ThrottleConfig};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let open = Throttle::builder(ThrottleConfig::with_max_concurrent(16))
    ///     .with_name("fs-open")
    ///     .build(OperationFn::new(|path: &'static str| async move {
    ///         Ok::<_, std::io::Error>(path.len())
    ///     }));
    ///
    /// assert_eq!(open.call("/etc/hosts").await.ok(), Some(10));
    /// # }
    /// ```
    pub fn builder(config: ThrottleConfig) -> ThrottleBuilder {
        ThrottleBuilder::new(config)
    }
}

impl<A, T, E> Throttle<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub(super) fn from_parts(op: OperationRef<A, T, E>, admission: Arc<Admission>) -> Self {
        Self { op, admission }
    }

    /// Invokes the operation through the admission queue.
    ///
    /// Must be called from within a tokio runtime; otherwise the returned
    /// handle fails with [`ThrottleError::Usage`] and nothing is queued.
    /// The call makes progress whether or not the handle is polled.
    pub fn call(&self, args: A) -> CallHandle<T, E> {
        let id = self.admission.next_call_id();
        let (tx, rx) = oneshot::channel();
        let handle = CallHandle::new(id, rx);

        let Ok(runtime) = Handle::try_current() else {
            let _ = tx.send(Err(ThrottleError::usage(
                "throttled call made outside a tokio runtime",
            )));
            return handle;
        };

        let op = Arc::clone(&self.op);
        self.admission.admit(PendingCall::new(id, move |slot| {
            runtime.spawn(run_call(op, args, slot, tx));
        }));
        handle
    }

    /// Number of invocations currently running.
    pub fn active(&self) -> usize {
        self.admission.active()
    }

    /// Number of calls waiting for capacity.
    pub fn pending(&self) -> usize {
        self.admission.pending()
    }

    /// The concurrency ceiling (at least 1).
    pub fn max_concurrent(&self) -> usize {
        self.admission.max()
    }

    /// Name given at build time, if any.
    pub fn name(&self) -> Option<&str> {
        self.admission.name()
    }
}

/// Runs one admitted call to completion.
///
/// The capacity is given back before the result is handed to the caller; the
/// queue is drained after.
async fn run_call<A, T, E>(
    op: OperationRef<A, T, E>,
    args: A,
    slot: Slot,
    reply: oneshot::Sender<Result<T, ThrottleError<E>>>,
) where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let res = AssertUnwindSafe(async move { op.invoke(args).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ThrottleError::from_panic(payload)));

    slot.settled(&res);
    let vacated = slot.vacate();
    // Handle dropped by the caller; the work still had to run.
    let _ = reply.send(res);
    drop(vacated);
}
