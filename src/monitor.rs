//! Cooperative cancellation signal threaded through long-running batch
//! operations (flush, deep purges).

use std::sync::atomic::{AtomicBool, Ordering};

pub trait ProgressMonitor: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// A monitor that never reports cancellation; the default for callers
/// that don't need to cancel in-flight work.
#[derive(Debug, Default)]
pub struct NullMonitor;

impl ProgressMonitor for NullMonitor {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A monitor a caller can flip from another thread to request
/// cancellation of an in-flight flush.
#[derive(Debug, Default)]
pub struct CancellationFlag(AtomicBool);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl ProgressMonitor for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
