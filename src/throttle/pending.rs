use super::slot::Slot;

/// One call waiting for capacity.
///
/// `launch` owns the call's arguments and result sender. It runs exactly once,
/// with the slot the call was admitted into.
pub(super) struct PendingCall {
    id: u64,
    launch: Box<dyn FnOnce(Slot) + Send + 'static>,
}

impl PendingCall {
    pub fn new(id: u64, launch: impl FnOnce(Slot) + Send + 'static) -> Self {
        Self {
            id,
            launch: Box::new(launch),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Starts the call. The slot is released when the call settles.
    pub fn start(self, slot: Slot) {
        (self.launch)(slot)
    }
}
