//! Terminal progress for graph builds.

use indicatif::{ProgressBar, ProgressStyle};
use palimpsest_core::{CancelFlag, ProgressMonitor};

/// Progress bar that also carries a cancellation flag
pub struct BarProgress {
    bar: ProgressBar,
    cancel: CancelFlag,
}

impl BarProgress {
    /// Visible bar with a message
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {bar:40.cyan/blue} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(message.to_string());
        Self {
            bar,
            cancel: CancelFlag::new(),
        }
    }

    /// Bar that draws nothing
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            cancel: CancelFlag::new(),
        }
    }

    /// Handle the host can use to cancel the build
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Cancel the build when the user presses Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if a signal handler is already installed
    pub fn cancel_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let cancel = self.cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
    }

    /// Units reported so far
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressMonitor for BarProgress {
    fn begin(&mut self, total_units: u64) {
        self.bar.set_length(total_units);
        self.bar.set_position(0);
    }

    fn worked(&mut self, units: u64) {
        self.bar.inc(units);
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    fn done(&mut self) {
        self.bar.finish_and_clear();
    }
}
