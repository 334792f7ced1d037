// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use depplan::{
    MemoryRegistry, PackageActionDescription, PackageDependency, PackageMetadata, PackageName,
    VersionRange,
};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn name(s: &str) -> PackageName {
    PackageName::parse(s).unwrap()
}

/// Registry metadata with `(id, range)` dependencies
pub fn meta(s: &str, deps: &[(&str, &str)]) -> PackageMetadata {
    deps.iter().fold(PackageMetadata::new(name(s)), |m, (id, range)| {
        m.with_dependency(PackageDependency::new(*id, VersionRange::parse(range).unwrap()))
    })
}

pub fn render(actions: &[PackageActionDescription]) -> Vec<String> {
    actions.iter().map(ToString::to_string).collect()
}

/// A has versions 1.0, 1.5 and 2.0; B@1.0 needs A in [1.0,2.0)
pub fn ab_registry() -> MemoryRegistry {
    MemoryRegistry::new()
        .with(meta("A@1.0", &[]))
        .with(meta("A@1.5", &[]))
        .with(meta("A@2.0", &[]))
        .with(meta("B@1.0", &[("A", "[1.0,2.0)")]))
}

/// A small web stack:
///
/// ```text
/// app -> web -> http -> log
///    \-> db  -----------/
/// ```
pub fn stack_registry() -> MemoryRegistry {
    MemoryRegistry::new()
        .with(meta("log@1.0.0", &[]))
        .with(meta("log@1.1.0", &[]))
        .with(meta("log@1.1.4", &[]))
        .with(meta("log@2.0.0", &[]))
        .with(meta("http@0.9.0", &[("log", "[1.0,2.0)")]))
        .with(meta("http@1.0.0", &[("log", "[1.1,2.0)")]))
        .with(meta("web@3.2.0", &[("http", ">= 0.9")]))
        .with(meta("db@5.0.0", &[("log", ">= 1.0")]).with_license_acceptance(true))
        .with(meta("app@1.0.0", &[("web", "[3.0,4.0)"), ("db", "[5.0,6.0)")]))
}

/// Feed file equivalent of `ab_registry`
pub const AB_FEED: &str = r#"
[[package]]
id = "A"
version = "1.0.0"

[[package]]
id = "A"
version = "1.5.0"

[[package]]
id = "A"
version = "2.0.0"

[[package]]
id = "B"
version = "1.0.0"
dependencies = [{ id = "A", range = "[1.0,2.0)" }]

[[package]]
id = "L"
version = "1.0.0"
requires_license_acceptance = true
license_url = "https://example.com/license"
"#;

/// Temporary directory with an initialized database and a feed file
///
/// Returns (TempDir, db_path, feed_path) - keep the TempDir alive to prevent cleanup.
pub fn setup_workspace() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state").join("installed.db");
    let feed_path = temp_dir.path().join("registry.toml");

    depplan::db::init(db_path.to_str().unwrap()).unwrap();
    std::fs::write(&feed_path, AB_FEED).unwrap();

    (temp_dir, db_path, feed_path)
}
