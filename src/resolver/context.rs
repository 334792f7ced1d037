// src/resolver/context.rs

//! Per-request resolution settings

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strum_macros::{Display, EnumIter, EnumString};

/// How dependency versions are chosen during install resolution
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DependencyBehavior {
    /// Install exactly the requested package, no transitive resolution
    Ignore,
    /// Lowest version satisfying all ranges
    #[default]
    Lowest,
    /// Highest patch within the lowest satisfying major.minor
    HighestPatch,
    /// Highest minor within the lowest satisfying major
    HighestMinor,
    /// Highest version satisfying all ranges
    Highest,
}

impl DependencyBehavior {
    /// Human-readable label for selection lists
    pub fn label(&self) -> &'static str {
        match self {
            DependencyBehavior::Ignore => "Ignore Dependencies",
            DependencyBehavior::Lowest => "Lowest",
            DependencyBehavior::HighestPatch => "Highest Patch",
            DependencyBehavior::HighestMinor => "Highest Minor",
            DependencyBehavior::Highest => "Highest",
        }
    }
}

/// Immutable configuration for one resolution request
#[derive(Debug, Clone)]
pub struct ResolverContext {
    pub dependency_behavior: DependencyBehavior,
    pub allow_prerelease: bool,
    /// Uninstall also removes dependencies installed only for the removed packages
    pub remove_dependencies: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self {
            dependency_behavior: DependencyBehavior::default(),
            allow_prerelease: false,
            remove_dependencies: true,
            cancel: None,
        }
    }
}

impl ResolverContext {
    pub fn new(dependency_behavior: DependencyBehavior) -> Self {
        Self {
            dependency_behavior,
            ..Self::default()
        }
    }

    pub fn with_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = allow;
        self
    }

    pub fn with_remove_dependencies(mut self, remove: bool) -> Self {
        self.remove_dependencies = remove;
        self
    }

    /// Set the cancel token, checked between traversal steps
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Return Cancelled error if cancellation requested
    pub(crate) fn check_cancelled(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled(stage.to_string()))
        } else {
            Ok(())
        }
    }
}
