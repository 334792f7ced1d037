// tests/sqlite_tracker.rs

//! End-to-end tests against a database on disk.
//!
//! Registry feed file -> Session -> SQLite installed set, then reopen the
//! database to check what persisted.

mod common;

use common::{name, render, setup_workspace};
use depplan::db::{ExecutionLock, SqliteInstalledSet};
use depplan::registry::load_feed;
use depplan::session::{AcceptAll, DeclineAll};
use depplan::{
    CommandOutcome, DependencyBehavior, Error, ExecutionOptions, InstallReason, InstalledSet,
    PackageCommand, PackageStatus, ResolverContext, Session, TrackerHandle,
};
use std::path::Path;
use std::sync::Arc;

fn open_session(db_path: &Path, feed_path: &Path) -> Session {
    let registry = load_feed(feed_path).unwrap();
    let installed = SqliteInstalledSet::open(db_path.to_str().unwrap()).unwrap();
    Session::new(Arc::new(registry), TrackerHandle::new(installed))
        .with_defaults(ResolverContext::new(DependencyBehavior::Highest))
}

#[test]
fn test_install_persists_across_reopen() {
    let (_temp_dir, db_path, feed_path) = setup_workspace();

    {
        let session = open_session(&db_path, &feed_path);
        let outcome = session
            .run_command(
                PackageCommand::Install,
                &name("B@1.0"),
                session.defaults(),
                &DeclineAll,
                &ExecutionOptions::default(),
            )
            .unwrap();

        match outcome {
            CommandOutcome::Executed { actions, report } => {
                assert_eq!(render(&actions), vec!["Install A@1.5.0", "Install B@1.0.0"]);
                assert!(report.succeeded());
            }
            other => panic!("expected execution, got {other:?}"),
        }
    }

    let reopened = SqliteInstalledSet::open(db_path.to_str().unwrap()).unwrap();
    let installed = reopened.get_installed().unwrap();
    assert_eq!(installed.len(), 2);
    assert_eq!(installed[0].name, name("A@1.5"));
    assert_eq!(installed[0].reason, InstallReason::Dependency);
    assert_eq!(installed[1].name, name("B@1.0"));
    assert_eq!(installed[1].reason, InstallReason::Explicit);
    assert_eq!(reopened.find_dependents("A").unwrap(), vec!["B".to_string()]);

    let deps = reopened.dependencies_of("B").unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].id, "A");
}

#[test]
fn test_preview_then_uninstall() {
    let (_temp_dir, db_path, feed_path) = setup_workspace();
    let session = open_session(&db_path, &feed_path);

    session
        .run_command(
            PackageCommand::Install,
            &name("B@1.0"),
            session.defaults(),
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();

    let outcome = session
        .run_command(
            PackageCommand::UninstallPreview,
            &name("A@1.5"),
            session.defaults(),
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();
    let CommandOutcome::Preview { actions, diff } = outcome else {
        panic!("expected a preview");
    };
    assert_eq!(render(&actions), vec!["Uninstall B@1.0.0", "Uninstall A@1.5.0"]);
    assert_eq!(diff.status_of(&name("B@1.0")), Some(PackageStatus::Removed));
    assert!(diff.added.is_empty());

    // Preview changed nothing
    assert_eq!(session.snapshot().unwrap().len(), 2);

    session
        .run_command(
            PackageCommand::Uninstall,
            &name("A@1.5"),
            session.defaults(),
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();
    assert!(session.snapshot().unwrap().is_empty());
}

#[test]
fn test_license_gate_with_feed() {
    let (_temp_dir, db_path, feed_path) = setup_workspace();
    let session = open_session(&db_path, &feed_path);

    let declined = session
        .run_command(
            PackageCommand::Install,
            &name("L@1.0"),
            session.defaults(),
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();
    assert!(matches!(declined, CommandOutcome::Declined { ref licenses } if licenses == &vec![name("L@1.0")]));
    assert!(session.snapshot().unwrap().is_empty());

    let licenses = session.licenses_in(
        &session
            .resolve_actions(
                depplan::PackageActionType::Install,
                &name("L@1.0"),
                session.defaults(),
            )
            .unwrap(),
    );
    assert_eq!(
        licenses[0].license_url.as_deref(),
        Some("https://example.com/license")
    );

    let accepted = session
        .run_command(
            PackageCommand::Install,
            &name("L@1.0"),
            session.defaults(),
            &AcceptAll,
            &ExecutionOptions::default(),
        )
        .unwrap();
    let CommandOutcome::Executed { report, .. } = accepted else {
        panic!("expected execution");
    };
    assert_eq!(report.accepted_licenses, vec![name("L@1.0")]);
}

#[test]
fn test_execution_lock_is_exclusive() {
    let (_temp_dir, db_path, _feed_path) = setup_workspace();

    let lock = ExecutionLock::try_acquire(&db_path).unwrap();
    assert!(lock.path().ends_with("installed.db.lock"));
    assert!(matches!(
        ExecutionLock::try_acquire(&db_path),
        Err(Error::ConcurrentExecution)
    ));

    drop(lock);
    assert!(ExecutionLock::try_acquire(&db_path).is_ok());
}

#[test]
fn test_upgrade_keeps_reason() {
    let (_temp_dir, db_path, feed_path) = setup_workspace();
    let session = open_session(&db_path, &feed_path);

    let lowest = ResolverContext::new(DependencyBehavior::Lowest);
    session
        .run_command(
            PackageCommand::Install,
            &name("A@1.0"),
            &lowest,
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();

    let outcome = session
        .run_command(
            PackageCommand::Install,
            &name("A@2.0"),
            &lowest,
            &DeclineAll,
            &ExecutionOptions::default(),
        )
        .unwrap();
    let CommandOutcome::Executed { actions, report } = outcome else {
        panic!("expected execution");
    };
    assert_eq!(render(&actions), vec!["Uninstall A@1.0.0", "Install A@2.0.0"]);
    assert!(report.succeeded());

    let installed = session.snapshot().unwrap().get_installed().unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].name, name("A@2.0"));
    assert_eq!(installed[0].reason, InstallReason::Explicit);
}
