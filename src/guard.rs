use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::{FindError, Truthy};

/// The receiving end of a completion signal, implemented by a run.
pub(crate) trait Settle: Send + Sync {
    fn settle(self: Arc<Self>, index: usize, verdict: bool);
}

/// Completion handle for one dispatched entry.
///
/// Exactly one call is expected per dispatch. Clones share the same
/// one-shot flag, so a second signal through any clone is rejected
/// with [`FindError::DoubleCompletion`] and never reaches the run.
#[derive(Clone)]
pub struct TaskCallback {
    index: usize,
    fired: Arc<AtomicBool>,
    run: Arc<dyn Settle>,
}

impl TaskCallback {
    pub(crate) fn new(index: usize, run: Arc<dyn Settle>) -> Self {
        TaskCallback {
            index,
            fired: Arc::new(AtomicBool::new(false)),
            run,
        }
    }

    /// Report the verdict for this entry.
    ///
    /// Any [`Truthy`] value is accepted. Returns an error, without
    /// touching the run, if this entry was already reported.
    pub fn call<T: Truthy>(&self, verdict: T) -> Result<(), FindError> {
        if self.fired.swap(true, Ordering::AcqRel) {
            warn!("callback for entry {} was called twice", self.index);
            return Err(FindError::DoubleCompletion);
        }
        self.run.clone().settle(self.index, verdict.is_truthy());
        Ok(())
    }

    /// Dispatch index of the entry this callback belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether a verdict has already been reported.
    pub fn is_called(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TaskCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCallback")
            .field("index", &self.index)
            .field("called", &self.is_called())
            .finish()
    }
}
