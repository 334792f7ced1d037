// src/resolver/plan.rs

//! Resolution plan data structures and ordering
//!
//! A `Closure` is the unordered output of resolution. `ActionPlanner` turns it
//! into the executable action list: every uninstall (dependents first), then
//! every install (dependencies first) with license acceptance directly ahead
//! of the install that needs it.

use super::graph::{DependencyEdge, DependencyGraph};
use crate::error::{Error, Result};
use crate::package::{InstallReason, PackageName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Kind of action applied to one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum PackageActionType {
    Install,
    Uninstall,
    AcceptLicense,
}

/// One step of an action plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageActionDescription {
    pub package: PackageName,
    pub action_type: PackageActionType,
    /// Reason recorded when an Install action is applied
    #[serde(default)]
    pub reason: InstallReason,
}

impl PackageActionDescription {
    pub fn install(package: PackageName, reason: InstallReason) -> Self {
        Self {
            package,
            action_type: PackageActionType::Install,
            reason,
        }
    }

    pub fn uninstall(package: PackageName) -> Self {
        Self {
            package,
            action_type: PackageActionType::Uninstall,
            reason: InstallReason::default(),
        }
    }

    pub fn accept_license(package: PackageName) -> Self {
        Self {
            package,
            action_type: PackageActionType::AcceptLicense,
            reason: InstallReason::default(),
        }
    }
}

impl fmt::Display for PackageActionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action_type, self.package)
    }
}

/// A package selected for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureNode {
    pub package: PackageName,
    pub reason: InstallReason,
    pub requires_license_acceptance: bool,
}

/// Unordered resolution result
#[derive(Debug, Clone, Default)]
pub struct Closure {
    pub installs: Vec<ClosureNode>,
    pub uninstalls: Vec<PackageName>,
    /// Dependency edges between packages in `installs`
    pub install_edges: Vec<DependencyEdge>,
    /// Recorded dependency edges between packages in `uninstalls`
    pub uninstall_edges: Vec<DependencyEdge>,
}

impl Closure {
    pub fn is_empty(&self) -> bool {
        self.installs.is_empty() && self.uninstalls.is_empty()
    }
}

/// Orders a closure into an executable plan
pub struct ActionPlanner;

impl ActionPlanner {
    pub fn plan(closure: &Closure) -> Result<Vec<PackageActionDescription>> {
        Self::check_conflicts(closure)?;

        let mut removal = DependencyGraph::new();
        for name in &closure.uninstalls {
            removal.add_node(name.clone());
        }
        for edge in &closure.uninstall_edges {
            removal.add_edge(edge.clone());
        }

        let mut install = DependencyGraph::new();
        let mut nodes: HashMap<&str, &ClosureNode> = HashMap::new();
        for node in &closure.installs {
            install.add_node(node.package.clone());
            nodes.insert(node.package.id.as_str(), node);
        }
        for edge in &closure.install_edges {
            install.add_edge(edge.clone());
        }

        let mut actions = Vec::with_capacity(closure.uninstalls.len() + closure.installs.len());

        for id in removal.dependents_first()? {
            if let Some(name) = removal.get_node(&id) {
                actions.push(PackageActionDescription::uninstall(name.clone()));
            }
        }

        for id in install.dependencies_first()? {
            if let Some(node) = nodes.get(id.as_str()) {
                if node.requires_license_acceptance {
                    actions.push(PackageActionDescription::accept_license(node.package.clone()));
                }
                actions.push(PackageActionDescription::install(
                    node.package.clone(),
                    node.reason,
                ));
            }
        }

        debug!("Planned {} action(s)", actions.len());
        Ok(actions)
    }

    /// A PackageName may appear under at most one action type, and an id at
    /// most once per action type
    fn check_conflicts(closure: &Closure) -> Result<()> {
        let removed: BTreeSet<&PackageName> = closure.uninstalls.iter().collect();
        if let Some(node) = closure.installs.iter().find(|n| removed.contains(&n.package)) {
            return Err(Error::ConflictingActions(format!(
                "{} is both installed and uninstalled",
                node.package
            )));
        }

        let mut seen: BTreeMap<&str, &PackageName> = BTreeMap::new();
        for name in closure.installs.iter().map(|n| &n.package) {
            if let Some(previous) = seen.insert(name.id.as_str(), name) {
                return Err(Error::ConflictingActions(format!(
                    "{} and {} are both selected for install",
                    previous, name
                )));
            }
        }

        seen.clear();
        for name in &closure.uninstalls {
            if let Some(previous) = seen.insert(name.id.as_str(), name) {
                return Err(Error::ConflictingActions(format!(
                    "{} and {} are both selected for removal",
                    previous, name
                )));
            }
        }

        Ok(())
    }
}
