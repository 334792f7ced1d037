// src/progress.rs

//! Execution progress reporting
//!
//! The executor reports each action of a plan through a `ProgressTracker`.
//! Implementations:
//! - `SilentProgress`: counters only, for scripted runs and tests
//! - `LogProgress`: one tracing line per action
//! - `CallbackProgress`: forwards `ProgressEvent`s to a closure
//!
//! The CLI adds an indicatif-backed tracker in `commands::progress`.
//!
//! ```ignore
//! let progress = Arc::new(LogProgress::new("install"));
//! let options = ExecutionOptions::new().with_progress(progress);
//! executor.execute_with(&actions, &options)?;
//! ```

use crate::resolver::PackageActionDescription;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, warn};

/// Receives execution progress
///
/// Shared with the executor behind an `Arc`, so implementations must be
/// thread-safe.
pub trait ProgressTracker: Send + Sync {
    /// A plan of `total` actions is about to run
    fn start(&self, total: u64);

    /// Action `index` (zero-based) is being applied
    fn action_started(&self, index: u64, action: &PackageActionDescription);

    fn action_committed(&self, action: &PackageActionDescription);

    /// The action failed; nothing after it runs
    fn action_failed(&self, action: &PackageActionDescription, reason: &str);

    /// Actions committed so far
    fn committed(&self) -> u64;

    /// Actions in the plan
    fn total(&self) -> u64;

    /// Every action committed
    fn finish(&self, message: &str);

    /// Execution stopped early (failure or cancellation)
    fn abandon(&self, message: &str);

    fn is_finished(&self) -> bool;
}

/// Counter state shared by the trackers in this module
#[derive(Debug, Default)]
struct Counters {
    committed: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
}

impl Counters {
    fn reset(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.committed.store(0, Ordering::Relaxed);
        self.finished.store(false, Ordering::Relaxed);
    }

    /// Count one commit, returning the new count
    fn commit(&self) -> u64 {
        self.committed.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    fn close(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    fn is_closed(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Tracker that only counts
#[derive(Debug, Default)]
pub struct SilentProgress {
    counters: Counters,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn start(&self, total: u64) {
        self.counters.reset(total);
    }

    fn action_started(&self, _index: u64, _action: &PackageActionDescription) {}

    fn action_committed(&self, _action: &PackageActionDescription) {
        self.counters.commit();
    }

    fn action_failed(&self, _action: &PackageActionDescription, _reason: &str) {}

    fn committed(&self) -> u64 {
        self.counters.committed()
    }

    fn total(&self) -> u64 {
        self.counters.total()
    }

    fn finish(&self, _message: &str) {
        self.counters.close();
    }

    fn abandon(&self, _message: &str) {
        self.counters.close();
    }

    fn is_finished(&self) -> bool {
        self.counters.is_closed()
    }
}

/// Tracker that logs every step
///
/// Used when the output is not a terminal, so progress still shows up in
/// logs.
#[derive(Debug)]
pub struct LogProgress {
    operation: String,
    counters: Counters,
}

impl LogProgress {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            counters: Counters::default(),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn start(&self, total: u64) {
        self.counters.reset(total);
        info!("{}: {} action(s) to apply", self.operation, total);
    }

    fn action_started(&self, index: u64, action: &PackageActionDescription) {
        info!(
            "{}: [{}/{}] {}",
            self.operation,
            index + 1,
            self.counters.total(),
            action
        );
    }

    fn action_committed(&self, _action: &PackageActionDescription) {
        self.counters.commit();
    }

    fn action_failed(&self, action: &PackageActionDescription, reason: &str) {
        warn!("{}: {} failed: {}", self.operation, action, reason);
    }

    fn committed(&self) -> u64 {
        self.counters.committed()
    }

    fn total(&self) -> u64 {
        self.counters.total()
    }

    fn finish(&self, message: &str) {
        self.counters.close();
        info!("{}: {}", self.operation, message);
    }

    fn abandon(&self, message: &str) {
        self.counters.close();
        warn!(
            "{}: stopped after {}/{}: {}",
            self.operation,
            self.counters.committed(),
            self.counters.total(),
            message
        );
    }

    fn is_finished(&self) -> bool {
        self.counters.is_closed()
    }
}

/// What a `CallbackProgress` reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: u64 },
    Applying { index: u64, action: String },
    Committed { current: u64, total: u64 },
    Failed { action: String, reason: String },
    Done(String),
    Abandoned(String),
}

/// Tracker that hands every event to a closure
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    counters: Counters,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            counters: Counters::default(),
        }
    }
}

impl<F> ProgressTracker for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn start(&self, total: u64) {
        self.counters.reset(total);
        (self.callback)(ProgressEvent::Started { total });
    }

    fn action_started(&self, index: u64, action: &PackageActionDescription) {
        (self.callback)(ProgressEvent::Applying {
            index,
            action: action.to_string(),
        });
    }

    fn action_committed(&self, _action: &PackageActionDescription) {
        let current = self.counters.commit();
        (self.callback)(ProgressEvent::Committed {
            current,
            total: self.counters.total(),
        });
    }

    fn action_failed(&self, action: &PackageActionDescription, reason: &str) {
        (self.callback)(ProgressEvent::Failed {
            action: action.to_string(),
            reason: reason.to_string(),
        });
    }

    fn committed(&self) -> u64 {
        self.counters.committed()
    }

    fn total(&self) -> u64 {
        self.counters.total()
    }

    fn finish(&self, message: &str) {
        self.counters.close();
        (self.callback)(ProgressEvent::Done(message.to_string()));
    }

    fn abandon(&self, message: &str) {
        self.counters.close();
        (self.callback)(ProgressEvent::Abandoned(message.to_string()));
    }

    fn is_finished(&self) -> bool {
        self.counters.is_closed()
    }
}
