// src/resolver/select.rs

//! Version selection policy

use super::context::DependencyBehavior;
use super::conflict::{Requirement, satisfies_all};
use crate::version::PackageVersion;

/// Versions admissible under every requirement, ascending
///
/// Prereleases are dropped unless `allow_prerelease` is set.
pub fn filter_candidates(
    available: Vec<PackageVersion>,
    requirements: &[&Requirement],
    allow_prerelease: bool,
) -> Vec<PackageVersion> {
    let mut candidates: Vec<PackageVersion> = available
        .into_iter()
        .filter(|v| allow_prerelease || !v.is_prerelease())
        .filter(|v| satisfies_all(v, requirements.iter().copied()))
        .collect();
    candidates.sort();
    candidates
}

/// Pick one version from ascending candidates according to `behavior`
///
/// `HighestMinor` and `HighestPatch` stay within the major (or major.minor)
/// of the lowest candidate. `Ignore` behaves like `Lowest` here; skipping
/// dependencies entirely is the resolver's job.
pub fn select_version(
    behavior: DependencyBehavior,
    candidates: &[PackageVersion],
) -> Option<&PackageVersion> {
    let lowest = candidates.first()?;

    match behavior {
        DependencyBehavior::Ignore | DependencyBehavior::Lowest => Some(lowest),
        DependencyBehavior::Highest => candidates.last(),
        DependencyBehavior::HighestMinor => candidates
            .iter()
            .filter(|v| v.major() == lowest.major())
            .max(),
        DependencyBehavior::HighestPatch => candidates
            .iter()
            .filter(|v| v.major() == lowest.major() && v.minor() == lowest.minor())
            .max(),
    }
}
