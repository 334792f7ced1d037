// src/transaction/mod.rs

//! Action executor
//!
//! Applies an ordered action plan to the installed set, one action at a time.
//! Each action moves through a small state machine:
//!
//! ```text
//! PENDING -> APPLYING -> COMMITTED
//!                    \-> FAILED
//! ```
//!
//! There is no batch rollback. When action k fails, actions before it stay
//! committed, execution stops, and the rest stay pending. The report always
//! lists every action with its final state so the caller can reconcile.
//!
//! Only one execution may hold an installed set at a time; a second
//! concurrent call fails with `ConcurrentExecution`.

use crate::error::{Error, Result};
use crate::installed::{InstalledSet, TrackerHandle};
use crate::package::{PackageDependency, PackageName};
use crate::progress::ProgressTracker;
use crate::registry::PackageRegistry;
use crate::resolver::{PackageActionDescription, PackageActionType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Per-action execution state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionState {
    /// Not attempted (never reached, or abandoned after cancel/failure)
    Pending,
    /// Currently being applied
    Applying,
    /// Applied and recorded in the installed set
    Committed,
    /// Failed with the given reason
    Failed(String),
}

impl ActionState {
    pub fn is_committed(&self) -> bool {
        matches!(self, ActionState::Committed)
    }
}

/// Final state of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub action: PackageActionDescription,
    pub state: ActionState,
}

impl ActionOutcome {
    fn pending(action: PackageActionDescription) -> Self {
        Self {
            action,
            state: ActionState::Pending,
        }
    }

    /// The failure as an `ActionExecution` error, if the action failed
    pub fn error(&self) -> Option<Error> {
        match &self.state {
            ActionState::Failed(reason) => Some(Error::ActionExecution {
                package: self.action.package.to_string(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Result of one execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// One entry per action, in plan order
    pub outcomes: Vec<ActionOutcome>,
    /// Packages whose license was accepted during this execution
    pub accepted_licenses: Vec<PackageName>,
    /// Execution stopped early because cancellation was requested
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl ExecutionReport {
    /// Every action committed
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(|o| o.state.is_committed())
    }

    pub fn committed(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.state.is_committed())
    }

    /// Actions left pending
    pub fn abandoned(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.state == ActionState::Pending)
    }

    /// The failed action, if any
    pub fn failure(&self) -> Option<&ActionOutcome> {
        self.outcomes
            .iter()
            .find(|o| matches!(o.state, ActionState::Failed(_)))
    }
}

/// Options for controlling execution
#[derive(Default, Clone)]
pub struct ExecutionOptions {
    /// Cancel token - set to true to abandon the remaining actions
    pub cancel: Option<Arc<AtomicBool>>,
    /// Progress tracker for reporting per-action progress
    pub progress: Option<Arc<dyn ProgressTracker>>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cancel token
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Set the progress tracker
    pub fn with_progress(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Applies action plans against one installed set
pub struct ActionExecutor {
    registry: Arc<dyn PackageRegistry>,
    tracker: TrackerHandle,
}

impl ActionExecutor {
    pub fn new(registry: Arc<dyn PackageRegistry>, tracker: TrackerHandle) -> Self {
        Self { registry, tracker }
    }

    /// Execute with default options
    pub fn execute_actions(&self, actions: &[PackageActionDescription]) -> Result<ExecutionReport> {
        self.execute_with(actions, &ExecutionOptions::default())
    }

    /// Execute a plan in order
    ///
    /// Fails as a whole only with `ConcurrentExecution`; per-action failures
    /// are reported in the returned report.
    pub fn execute_with(
        &self,
        actions: &[PackageActionDescription],
        options: &ExecutionOptions,
    ) -> Result<ExecutionReport> {
        let mut guard = self.tracker.try_acquire()?;

        let execution_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Execution {} started: {} action(s)", execution_id, actions.len());

        let mut outcomes: Vec<ActionOutcome> =
            actions.iter().cloned().map(ActionOutcome::pending).collect();
        let mut accepted_licenses = Vec::new();
        let mut cancelled = false;

        if let Some(progress) = &options.progress {
            progress.start(actions.len() as u64);
        }

        for (index, outcome) in outcomes.iter_mut().enumerate() {
            if options.is_cancelled() {
                info!("Execution {} cancelled before {}", execution_id, outcome.action);
                cancelled = true;
                break;
            }

            outcome.state = ActionState::Applying;
            if let Some(progress) = &options.progress {
                progress.action_started(index as u64, &outcome.action);
            }

            match self.apply(&mut *guard, &outcome.action) {
                Ok(()) => {
                    if outcome.action.action_type == PackageActionType::AcceptLicense {
                        accepted_licenses.push(outcome.action.package.clone());
                    }
                    info!("Committed {}", outcome.action);
                    outcome.state = ActionState::Committed;
                    if let Some(progress) = &options.progress {
                        progress.action_committed(&outcome.action);
                    }
                }
                Err(e) => {
                    let reason = match e {
                        Error::ActionExecution { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!("{} failed: {}", outcome.action, reason);
                    if let Some(progress) = &options.progress {
                        progress.action_failed(&outcome.action, &reason);
                    }
                    outcome.state = ActionState::Failed(reason);
                    break;
                }
            }
        }

        let report = ExecutionReport {
            execution_id,
            started_at,
            outcomes,
            accepted_licenses,
            cancelled,
            duration_ms: timer.elapsed().as_millis() as u64,
        };

        if let Some(progress) = &options.progress {
            if report.succeeded() {
                progress.finish("all actions committed");
            } else if let Some(failed) = report.failure() {
                progress.abandon(&format!("{} failed", failed.action));
            } else {
                progress.abandon("cancelled");
            }
        }

        info!(
            "Execution {} finished in {}ms: {}/{} committed",
            report.execution_id,
            report.duration_ms,
            report.committed().count(),
            report.outcomes.len()
        );
        Ok(report)
    }

    fn apply(
        &self,
        installed: &mut (dyn InstalledSet + Send),
        action: &PackageActionDescription,
    ) -> Result<()> {
        let package = &action.package;
        match action.action_type {
            PackageActionType::AcceptLicense => Ok(()),
            PackageActionType::Install => {
                let dependencies: Vec<PackageDependency> = self
                    .registry
                    .get_package(&package.id, &package.version)
                    .map(|meta| meta.dependencies)
                    .ok_or_else(|| Error::ActionExecution {
                        package: package.to_string(),
                        reason: "package is not in the registry".to_string(),
                    })?;
                installed.record_install(package, &dependencies, action.reason)
            }
            PackageActionType::Uninstall => installed.record_uninstall(package),
        }
    }
}
