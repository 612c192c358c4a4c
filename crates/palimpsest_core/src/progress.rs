//! Progress reporting and cooperative cancellation.
//!
//! Long builds call [`ProgressMonitor::is_canceled`] once per outer loop
//! iteration and abandon their work when it returns `true`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Progress/cancellation surface handed to long-running builders by their host
pub trait ProgressMonitor {
    /// Announce the total number of work units
    fn begin(&mut self, total_units: u64);

    /// Report `units` more units done
    fn worked(&mut self, units: u64);

    /// Whether the host asked to stop
    fn is_canceled(&self) -> bool;

    /// Report completion
    fn done(&mut self) {}
}

/// Monitor that reports nothing and never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin(&mut self, _total_units: u64) {}

    fn worked(&mut self, _units: u64) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shared cancellation flag with a work counter
///
/// Clones share the same flag, so a host can keep one clone and pass
/// another to the builder.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    canceled: Arc<AtomicBool>,
    total: Arc<AtomicU64>,
    done: Arc<AtomicU64>,
}

impl CancelFlag {
    /// Create a new, un-canceled flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Clear a previous cancellation
    pub fn reset(&self) {
        self.canceled.store(false, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
    }

    /// Units announced by `begin`
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Units reported by `worked`
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancelFlag {
    fn begin(&mut self, total_units: u64) {
        self.total.fetch_add(total_units, Ordering::SeqCst);
    }

    fn worked(&mut self, units: u64) {
        self.done.fetch_add(units, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

impl<P: ProgressMonitor + ?Sized> ProgressMonitor for &mut P {
    fn begin(&mut self, total_units: u64) {
        (**self).begin(total_units);
    }

    fn worked(&mut self, units: u64) {
        (**self).worked(units);
    }

    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }

    fn done(&mut self) {
        (**self).done();
    }
}
