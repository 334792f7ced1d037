// tests/execution.rs

//! Integration tests for plan execution.
//!
//! These tests verify that:
//! 1. A second execution against a busy installed set is rejected, while a
//!    snapshot in progress only delays an execution
//! 2. A failing action stops execution and leaves earlier actions committed
//! 3. Cancellation abandons the remaining actions between steps
//! 4. Progress events follow the plan

mod common;

use common::{ab_registry, name};
use depplan::{
    ActionExecutor, ActionState, CallbackProgress, Error, ExecutionOptions, InstallReason,
    InstalledPackage, InstalledSet, MemoryInstalledSet, PackageActionDescription,
    PackageDependency, PackageName, PackageVersion, ProgressEvent, TrackerHandle,
};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Installed set that parks every install until the test releases it
struct GatedSet {
    inner: MemoryInstalledSet,
    entered: Sender<()>,
    release: Receiver<()>,
}

impl InstalledSet for GatedSet {
    fn get_installed(&self) -> depplan::Result<Vec<InstalledPackage>> {
        self.inner.get_installed()
    }

    fn installed_version(&self, id: &str) -> depplan::Result<Option<PackageVersion>> {
        self.inner.installed_version(id)
    }

    fn dependencies_of(&self, id: &str) -> depplan::Result<Vec<PackageDependency>> {
        self.inner.dependencies_of(id)
    }

    fn record_install(
        &mut self,
        name: &PackageName,
        dependencies: &[PackageDependency],
        reason: InstallReason,
    ) -> depplan::Result<()> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        self.inner.record_install(name, dependencies, reason)
    }

    fn record_uninstall(&mut self, name: &PackageName) -> depplan::Result<()> {
        self.inner.record_uninstall(name)
    }
}

fn ab_plan() -> Vec<PackageActionDescription> {
    vec![
        PackageActionDescription::install(name("A@1.5"), InstallReason::Dependency),
        PackageActionDescription::install(name("B@1.0"), InstallReason::Explicit),
    ]
}

#[test]
fn test_concurrent_execution_is_rejected() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let tracker = TrackerHandle::new(GatedSet {
        inner: MemoryInstalledSet::new(),
        entered: entered_tx,
        release: release_rx,
    });
    let registry = Arc::new(ab_registry());

    let first = ActionExecutor::new(registry.clone(), tracker.clone());
    let worker = thread::spawn(move || first.execute_actions(&ab_plan()));

    // The first execution is parked inside its first install
    entered_rx.recv().unwrap();
    assert!(tracker.is_busy());

    let second = ActionExecutor::new(registry, tracker.clone());
    let plan = vec![PackageActionDescription::install(
        name("A@1.0"),
        InstallReason::Explicit,
    )];
    assert!(matches!(
        second.execute_actions(&plan),
        Err(Error::ConcurrentExecution)
    ));

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    let report = worker.join().unwrap().unwrap();
    assert!(report.succeeded());

    // Only the first execution's mutations landed
    let installed: Vec<String> = tracker
        .snapshot()
        .unwrap()
        .get_installed()
        .unwrap()
        .iter()
        .map(|p| p.name.to_string())
        .collect();
    assert_eq!(installed, vec!["A@1.5.0", "B@1.0.0"]);
    assert!(!tracker.is_busy());
}

/// Installed set whose listing parks until the test releases it
struct ParkedReader {
    inner: MemoryInstalledSet,
    entered: Sender<()>,
    release: Receiver<()>,
}

impl InstalledSet for ParkedReader {
    fn get_installed(&self) -> depplan::Result<Vec<InstalledPackage>> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        self.inner.get_installed()
    }

    fn installed_version(&self, id: &str) -> depplan::Result<Option<PackageVersion>> {
        self.inner.installed_version(id)
    }

    fn dependencies_of(&self, id: &str) -> depplan::Result<Vec<PackageDependency>> {
        self.inner.dependencies_of(id)
    }

    fn record_install(
        &mut self,
        name: &PackageName,
        dependencies: &[PackageDependency],
        reason: InstallReason,
    ) -> depplan::Result<()> {
        self.inner.record_install(name, dependencies, reason)
    }

    fn record_uninstall(&mut self, name: &PackageName) -> depplan::Result<()> {
        self.inner.record_uninstall(name)
    }
}

#[test]
fn test_execution_waits_for_running_snapshot() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let tracker = TrackerHandle::new(ParkedReader {
        inner: MemoryInstalledSet::new(),
        entered: entered_tx,
        release: release_rx,
    });

    let reader = tracker.clone();
    let snapshot = thread::spawn(move || reader.snapshot().map(|s| s.len()));
    entered_rx.recv().unwrap();
    assert!(!tracker.is_busy());

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let _ = release_tx.send(());
    });

    let report = ActionExecutor::new(Arc::new(ab_registry()), tracker.clone())
        .execute_actions(&ab_plan())
        .unwrap();
    assert!(report.succeeded());

    assert_eq!(snapshot.join().unwrap().unwrap(), 0);
    releaser.join().unwrap();
    assert!(!tracker.is_busy());
}

#[test]
fn test_failure_stops_execution() {
    let tracker = TrackerHandle::new(MemoryInstalledSet::new());
    let executor = ActionExecutor::new(Arc::new(ab_registry()), tracker.clone());

    let plan = vec![
        PackageActionDescription::install(name("A@1.0"), InstallReason::Dependency),
        PackageActionDescription::install(name("ghost@1.0"), InstallReason::Dependency),
        PackageActionDescription::install(name("B@1.0"), InstallReason::Explicit),
    ];
    let report = executor.execute_actions(&plan).unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].state, ActionState::Committed);
    assert!(matches!(report.outcomes[1].state, ActionState::Failed(_)));
    assert_eq!(report.outcomes[2].state, ActionState::Pending);
    assert_eq!(
        report.abandoned().next().unwrap().action.to_string(),
        "Install B@1.0.0"
    );

    match report.failure().and_then(|o| o.error()) {
        Some(Error::ActionExecution { package, reason }) => {
            assert_eq!(package, "ghost@1.0.0");
            assert!(reason.contains("registry"));
        }
        other => panic!("expected an action error, got {other:?}"),
    }

    // The committed install stays recorded
    let snapshot = tracker.snapshot().unwrap();
    assert!(snapshot.is_installed("A", &PackageVersion::new(1, 0, 0)).unwrap());
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_uninstall_of_missing_package_fails() {
    let tracker = TrackerHandle::new(MemoryInstalledSet::new());
    let executor = ActionExecutor::new(Arc::new(ab_registry()), tracker);

    let report = executor
        .execute_actions(&[PackageActionDescription::uninstall(name("A@1.0"))])
        .unwrap();
    assert!(matches!(report.outcomes[0].state, ActionState::Failed(_)));
}

#[test]
fn test_cancel_abandons_remaining_actions() {
    let tracker = TrackerHandle::new(MemoryInstalledSet::new());
    let executor = ActionExecutor::new(Arc::new(ab_registry()), tracker.clone());

    let cancel = Arc::new(AtomicBool::new(false));
    let token = cancel.clone();
    let progress = Arc::new(CallbackProgress::new(move |event| {
        if matches!(event, ProgressEvent::Committed { current: 1, .. }) {
            token.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    }));

    let options = ExecutionOptions::new()
        .with_cancel(cancel)
        .with_progress(progress);
    let report = executor.execute_with(&ab_plan(), &options).unwrap();

    assert!(report.cancelled);
    assert!(!report.succeeded());
    assert_eq!(report.committed().count(), 1);
    assert_eq!(report.abandoned().count(), 1);
    assert_eq!(tracker.snapshot().unwrap().len(), 1);
}

#[test]
fn test_progress_events_follow_plan() {
    let tracker = TrackerHandle::new(MemoryInstalledSet::new());
    let executor = ActionExecutor::new(Arc::new(ab_registry()), tracker);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let progress = Arc::new(CallbackProgress::new(move |event| {
        sink.lock().unwrap().push(event);
    }));

    let report = executor
        .execute_with(&ab_plan(), &ExecutionOptions::new().with_progress(progress))
        .unwrap();
    assert!(report.succeeded());

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            ProgressEvent::Started { total: 2 },
            ProgressEvent::Applying {
                index: 0,
                action: "Install A@1.5.0".to_string()
            },
            ProgressEvent::Committed { current: 1, total: 2 },
            ProgressEvent::Applying {
                index: 1,
                action: "Install B@1.0.0".to_string()
            },
            ProgressEvent::Committed { current: 2, total: 2 },
            ProgressEvent::Done("all actions committed".to_string()),
        ]
    );
}
