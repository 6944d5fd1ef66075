//! Stopping a run early at the user's request.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::errors::ReconditionError;

/// A flag that asks a running reconditioning to stop, e.g. raised from a signal handler.  Clones
/// share the same flag.
///
/// The flag is checked before each record is read or written; once raised, the run fails with
/// [`ReconditionError::Interrupted`] and no output file is left behind.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [`ReconditionError::Interrupted`] once the flag has been raised.
    pub fn check(&self) -> Result<(), ReconditionError> {
        if self.is_raised() {
            Err(ReconditionError::Interrupted)
        } else {
            Ok(())
        }
    }
}
