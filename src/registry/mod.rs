// src/registry/mod.rs

//! Read-only view of available package metadata
//!
//! The resolver only ever sees a registry through the `PackageRegistry`
//! trait. `MemoryRegistry` is the default implementation; it can be built
//! programmatically or loaded from a TOML feed file (see [`feed`]).

pub mod feed;

use crate::package::PackageMetadata;
use crate::version::PackageVersion;
use std::collections::BTreeMap;
use tracing::debug;

pub use feed::{load_feed, parse_feed};

/// Registry queries used by resolution and execution
pub trait PackageRegistry: Send + Sync {
    /// Look up metadata for an exact package version
    fn get_package(&self, id: &str, version: &PackageVersion) -> Option<PackageMetadata>;

    /// All published versions of a package id, ascending
    fn get_versions(&self, id: &str) -> Vec<PackageVersion>;
}

/// In-memory registry keyed by id and version
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistry {
    packages: BTreeMap<String, BTreeMap<PackageVersion, PackageMetadata>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a package version
    pub fn add(&mut self, metadata: PackageMetadata) {
        debug!("Registry add: {}", metadata.name);
        self.packages
            .entry(metadata.name.id.clone())
            .or_default()
            .insert(metadata.name.version.clone(), metadata);
    }

    /// Builder-style variant of [`MemoryRegistry::add`]
    pub fn with(mut self, metadata: PackageMetadata) -> Self {
        self.add(metadata);
        self
    }

    /// Number of distinct package ids
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Number of package versions across all ids
    pub fn version_count(&self) -> usize {
        self.packages.values().map(BTreeMap::len).sum()
    }

    /// Iterate every package version, ordered by id then version
    pub fn iter(&self) -> impl Iterator<Item = &PackageMetadata> {
        self.packages.values().flat_map(BTreeMap::values)
    }
}

impl PackageRegistry for MemoryRegistry {
    fn get_package(&self, id: &str, version: &PackageVersion) -> Option<PackageMetadata> {
        self.packages.get(id)?.get(version).cloned()
    }

    fn get_versions(&self, id: &str) -> Vec<PackageVersion> {
        self.packages
            .get(id)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }
}
