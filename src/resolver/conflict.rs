// src/resolver/conflict.rs

//! Requirement bookkeeping for constraint propagation
//!
//! Every range imposed on a package id is kept together with the package
//! that imposed it, so an unsatisfiable set can be reported in full.

use crate::package::PackageName;
use crate::version::{PackageVersion, VersionRange};
use std::collections::BTreeMap;
use std::fmt;

/// A range imposed on a package id by another package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub required_by: PackageName,
    pub range: VersionRange,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (required by {})", self.range, self.required_by)
    }
}

/// Requirements grouped by the id they constrain
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    by_target: BTreeMap<String, Vec<Requirement>>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: &str, requirement: Requirement) {
        self.by_target
            .entry(target.to_string())
            .or_default()
            .push(requirement);
    }

    /// Drop every requirement imposed by any version of `required_by_id`
    pub fn remove_from(&mut self, required_by_id: &str) {
        for requirements in self.by_target.values_mut() {
            requirements.retain(|r| r.required_by.id != required_by_id);
        }
        self.by_target.retain(|_, requirements| !requirements.is_empty());
    }

    pub fn for_target(&self, target: &str) -> &[Requirement] {
        self.by_target.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids that any version of `required_by_id` constrains
    pub fn targets_of(&self, required_by_id: &str) -> Vec<String> {
        self.by_target
            .iter()
            .filter(|(_, requirements)| {
                requirements.iter().any(|r| r.required_by.id == required_by_id)
            })
            .map(|(target, _)| target.clone())
            .collect()
    }
}

/// Whether a version satisfies every requirement
pub fn satisfies_all<'a>(
    version: &PackageVersion,
    requirements: impl IntoIterator<Item = &'a Requirement>,
) -> bool {
    requirements.into_iter().all(|r| r.range.satisfies(version))
}

/// Render requirements for error messages
pub fn describe<'a>(requirements: impl IntoIterator<Item = &'a Requirement>) -> String {
    let parts: Vec<String> = requirements.into_iter().map(ToString::to_string).collect();
    if parts.is_empty() {
        "any available version".to_string()
    } else {
        parts.join("; ")
    }
}
