//! Cooperative cancellation for a sync run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::SyncError;

/// Shared flag checked by the reconciler before each directory call.
///
/// Clones share the flag, so a signal handler can hold one clone while the
/// run holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(SyncError::Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), SyncError> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}
