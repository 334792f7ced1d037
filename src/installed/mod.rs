// src/installed/mod.rs

//! Installed-set tracking
//!
//! The installed set records which packages are present (one version per id),
//! why they were installed, and the dependency list each one had when it was
//! installed. That recorded graph is what uninstall resolution walks.
//!
//! Implementations:
//! - `MemoryInstalledSet`: in-process state, also used for snapshots
//! - `crate::db::SqliteInstalledSet`: persistent state in SQLite

mod handle;

pub use handle::{TrackerGuard, TrackerHandle};

use crate::error::{Error, Result};
use crate::package::{InstallReason, InstalledPackage, PackageDependency, PackageName};
use crate::version::PackageVersion;
use std::collections::BTreeMap;
use tracing::debug;

/// Query and mutation interface over installed packages
pub trait InstalledSet {
    /// All installed packages, ordered by id
    fn get_installed(&self) -> Result<Vec<InstalledPackage>>;

    /// Installed version of an id, if any
    fn installed_version(&self, id: &str) -> Result<Option<PackageVersion>>;

    /// Dependencies recorded for an installed id (empty if not installed)
    fn dependencies_of(&self, id: &str) -> Result<Vec<PackageDependency>>;

    /// Record a package as installed
    ///
    /// Fails if any version of the same id is already installed.
    fn record_install(
        &mut self,
        name: &PackageName,
        dependencies: &[PackageDependency],
        reason: InstallReason,
    ) -> Result<()>;

    /// Remove a package from the installed set
    ///
    /// Fails if that exact package is not installed.
    fn record_uninstall(&mut self, name: &PackageName) -> Result<()>;

    /// Whether this exact id and version is installed
    fn is_installed(&self, id: &str, version: &PackageVersion) -> Result<bool> {
        Ok(self.installed_version(id)?.as_ref() == Some(version))
    }

    /// Installed record for an id, if any
    fn get(&self, id: &str) -> Result<Option<InstalledPackage>> {
        Ok(self.get_installed()?.into_iter().find(|p| p.name.id == id))
    }
}

/// Error for installing over an existing version of the same id
pub(crate) fn already_installed(name: &PackageName, existing: &PackageVersion) -> Error {
    Error::ActionExecution {
        package: name.to_string(),
        reason: format!("{}@{} is already installed", name.id, existing),
    }
}

/// Error for removing a package that is not present
pub(crate) fn not_installed(name: &PackageName) -> Error {
    Error::ActionExecution {
        package: name.to_string(),
        reason: "package is not installed".to_string(),
    }
}

#[derive(Debug, Clone)]
struct InstalledEntry {
    package: InstalledPackage,
    dependencies: Vec<PackageDependency>,
}

/// In-memory installed set
#[derive(Debug, Clone, Default)]
pub struct MemoryInstalledSet {
    entries: BTreeMap<String, InstalledEntry>,
}

impl MemoryInstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the full state of another installed set
    ///
    /// Resolution runs against such a snapshot so it never observes an
    /// execution in progress.
    pub fn snapshot_of(source: &dyn InstalledSet) -> Result<Self> {
        let mut snapshot = Self::new();
        for package in source.get_installed()? {
            let dependencies = source.dependencies_of(&package.name.id)?;
            snapshot.entries.insert(
                package.name.id.clone(),
                InstalledEntry {
                    package,
                    dependencies,
                },
            );
        }
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InstalledSet for MemoryInstalledSet {
    fn get_installed(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self.entries.values().map(|e| e.package.clone()).collect())
    }

    fn installed_version(&self, id: &str) -> Result<Option<PackageVersion>> {
        Ok(self.entries.get(id).map(|e| e.package.name.version.clone()))
    }

    fn dependencies_of(&self, id: &str) -> Result<Vec<PackageDependency>> {
        Ok(self
            .entries
            .get(id)
            .map(|e| e.dependencies.clone())
            .unwrap_or_default())
    }

    fn record_install(
        &mut self,
        name: &PackageName,
        dependencies: &[PackageDependency],
        reason: InstallReason,
    ) -> Result<()> {
        if let Some(existing) = self.entries.get(&name.id) {
            return Err(already_installed(name, &existing.package.name.version));
        }

        debug!("Recording install of {} ({})", name, reason.as_str());
        self.entries.insert(
            name.id.clone(),
            InstalledEntry {
                package: InstalledPackage::new(name.clone(), reason),
                dependencies: dependencies.to_vec(),
            },
        );
        Ok(())
    }

    fn record_uninstall(&mut self, name: &PackageName) -> Result<()> {
        match self.entries.get(&name.id) {
            Some(entry) if entry.package.name == *name => {
                debug!("Recording uninstall of {}", name);
                self.entries.remove(&name.id);
                Ok(())
            }
            _ => Err(not_installed(name)),
        }
    }

    fn get(&self, id: &str) -> Result<Option<InstalledPackage>> {
        Ok(self.entries.get(id).map(|e| e.package.clone()))
    }
}
