// src/commands/progress.rs
//! Terminal progress for plan execution
//!
//! An overall bar counts committed actions; a spinner line below it shows the
//! action being applied.

use depplan::{PackageActionDescription, PackageActionType, ProgressTracker};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct CliProgress {
    // Keeps both bars drawn as one group
    _multi: MultiProgress,
    overall: ProgressBar,
    status: ProgressBar,
    finished: AtomicBool,
}

impl CliProgress {
    /// Create a tracker labelled with the operation (e.g. "Installing")
    pub fn new(operation: &str) -> Self {
        let multi = MultiProgress::new();

        let overall = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} ({pos}/{len}) [{bar:40.green/dim}] {percent}%")
        {
            overall.set_style(style.progress_chars("##-"));
        }
        overall.set_message(operation.to_string());

        let status = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
            status.set_style(style);
        }
        status.enable_steady_tick(Duration::from_millis(100));

        let overall = multi.add(overall);
        let status = multi.add(status);

        Self {
            _multi: multi,
            overall,
            status,
            finished: AtomicBool::new(false),
        }
    }

    /// Clear the spinner and leave the overall bar in its final state
    fn close(&self, last: impl FnOnce(&ProgressBar)) {
        self.status.finish_and_clear();
        last(&self.overall);
        self.finished.store(true, Ordering::Relaxed);
    }
}

fn phase(action: &PackageActionDescription) -> String {
    match action.action_type {
        PackageActionType::AcceptLicense => format!("Accepting license for {}...", action.package),
        PackageActionType::Install => format!("Installing {}...", action.package),
        PackageActionType::Uninstall => format!("Removing {}...", action.package),
    }
}

impl ProgressTracker for CliProgress {
    fn start(&self, total: u64) {
        self.overall.set_length(total);
        self.overall.set_position(0);
    }

    fn action_started(&self, _index: u64, action: &PackageActionDescription) {
        self.status.set_message(phase(action));
    }

    fn action_committed(&self, action: &PackageActionDescription) {
        self.overall.inc(1);
        self.status.set_message(format!("{} [done]", action.package));
    }

    fn action_failed(&self, action: &PackageActionDescription, reason: &str) {
        self.status
            .set_message(format!("{} [FAILED: {}]", action.package, reason));
    }

    fn committed(&self) -> u64 {
        self.overall.position()
    }

    fn total(&self) -> u64 {
        self.overall.length().unwrap_or(0)
    }

    fn finish(&self, message: &str) {
        self.close(|bar| bar.finish_with_message(message.to_string()));
    }

    fn abandon(&self, message: &str) {
        self.close(|bar| bar.abandon_with_message(format!("[stopped] {message}")));
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}
