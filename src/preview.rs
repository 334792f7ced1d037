// src/preview.rs

//! Preview of what an action plan would change
//!
//! The installed set before execution is partitioned against the plan into
//! packages left alone, packages removed and packages added.

use crate::error::Result;
use crate::installed::InstalledSet;
use crate::package::PackageName;
use crate::resolver::{PackageActionDescription, PackageActionType};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use strum_macros::{AsRefStr, Display};

/// Where a package ends up relative to the current installed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PackageStatus {
    Unchanged,
    Removed,
    Added,
}

/// Three-way diff between the installed set and the result of a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewDiff {
    pub unchanged: Vec<PackageName>,
    pub removed: Vec<PackageName>,
    pub added: Vec<PackageName>,
}

impl PreviewDiff {
    /// No package would change
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Status of one package, if the diff mentions it
    pub fn status_of(&self, name: &PackageName) -> Option<PackageStatus> {
        if self.added.contains(name) {
            Some(PackageStatus::Added)
        } else if self.removed.contains(name) {
            Some(PackageStatus::Removed)
        } else if self.unchanged.contains(name) {
            Some(PackageStatus::Unchanged)
        } else {
            None
        }
    }

    /// All entries with their status: unchanged, then removed, then added
    pub fn entries(&self) -> impl Iterator<Item = (&PackageName, PackageStatus)> {
        self.unchanged
            .iter()
            .map(|n| (n, PackageStatus::Unchanged))
            .chain(self.removed.iter().map(|n| (n, PackageStatus::Removed)))
            .chain(self.added.iter().map(|n| (n, PackageStatus::Added)))
    }
}

impl fmt::Display for PreviewDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No changes.");
        }
        for (name, status) in self.entries() {
            let marker = match status {
                PackageStatus::Unchanged => ' ',
                PackageStatus::Removed => '-',
                PackageStatus::Added => '+',
            };
            writeln!(f, "{marker} {name}")?;
        }
        Ok(())
    }
}

/// Diff the installed set against a plan
///
/// Lists are sorted by id then version. A package both uninstalled and
/// re-added at another version shows up once in each of `removed` and
/// `added`.
pub fn compute_preview(
    installed: &dyn InstalledSet,
    actions: &[PackageActionDescription],
) -> Result<PreviewDiff> {
    let before: BTreeSet<PackageName> = installed
        .get_installed()?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let of_type = |action_type: PackageActionType| -> BTreeSet<PackageName> {
        actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .map(|a| a.package.clone())
            .collect()
    };
    let uninstalled = of_type(PackageActionType::Uninstall);
    let installed_now = of_type(PackageActionType::Install);

    Ok(PreviewDiff {
        unchanged: before.difference(&uninstalled).cloned().collect(),
        removed: before.intersection(&uninstalled).cloned().collect(),
        added: installed_now.difference(&before).cloned().collect(),
    })
}
