use std::sync::Arc;

use crate::error::ThrottleError;
use crate::events::{Event, EventKind};

use super::admission::Admission;

/// Capacity held by one running call.
///
/// Dropping the slot gives the capacity back and runs the drain step. The drop
/// happens however the call ends: resolved, failed, panicked, or abandoned.
pub(super) struct Slot {
    admission: Arc<Admission>,
    call: u64,
    held: bool,
}

/// Capacity already given back whose drain step is still owed.
///
/// Dropping it runs the drain step.
pub(super) struct Vacated {
    admission: Arc<Admission>,
}

impl Slot {
    pub fn new(admission: Arc<Admission>, call: u64) -> Self {
        Self {
            admission,
            call,
            held: true,
        }
    }

    /// Gives the capacity back now and defers the drain step to the returned guard.
    pub fn vacate(mut self) -> Vacated {
        self.held = false;
        self.admission.give_back();
        Vacated {
            admission: Arc::clone(&self.admission),
        }
    }

    /// Publishes `CallSettled` or `CallFailed` for the call's result.
    pub fn settled<T, E>(&self, res: &Result<T, ThrottleError<E>>) {
        let call = self.call;
        match res {
            Ok(_) => self
                .admission
                .publish(|| Event::new(EventKind::CallSettled).with_call(call)),
            Err(e) => {
                let label = e.as_label();
                self.admission.publish(|| {
                    Event::new(EventKind::CallFailed)
                        .with_call(call)
                        .with_reason(label)
                })
            }
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.held {
            self.admission.release();
        }
    }
}

impl Drop for Vacated {
    fn drop(&mut self) {
        self.admission.drain();
    }
}
