// src/registry/feed.rs

//! Parser for registry feed TOML files
//!
//! ```toml
//! [[package]]
//! id = "B"
//! version = "1.0.0"
//! requires_license_acceptance = true
//! license_url = "https://example.com/license"
//! dependencies = [{ id = "A", range = "[1.0,2.0)" }]
//! ```

use super::MemoryRegistry;
use crate::error::{Error, Result};
use crate::package::{PackageDependency, PackageMetadata, PackageName};
use crate::version::PackageVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level feed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedFile {
    #[serde(rename = "package", default)]
    pub packages: Vec<FeedEntry>,
}

/// One package version in a feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub version: PackageVersion,
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
    #[serde(default)]
    pub requires_license_acceptance: bool,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl From<FeedEntry> for PackageMetadata {
    fn from(entry: FeedEntry) -> Self {
        Self {
            name: PackageName::new(entry.id, entry.version),
            dependencies: entry.dependencies,
            requires_license_acceptance: entry.requires_license_acceptance,
            license_url: entry.license_url,
            summary: entry.summary,
        }
    }
}

/// Parse feed TOML content into a registry
pub fn parse_feed(content: &str) -> Result<MemoryRegistry> {
    let feed: FeedFile =
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid feed: {e}")))?;

    let mut registry = MemoryRegistry::new();
    for entry in feed.packages {
        registry.add(entry.into());
    }
    Ok(registry)
}

/// Load a feed file from disk
pub fn load_feed(path: &Path) -> Result<MemoryRegistry> {
    let content = fs::read_to_string(path)?;
    let registry = parse_feed(&content)?;
    info!(
        "Loaded {} packages ({} versions) from {}",
        registry.package_count(),
        registry.version_count(),
        path.display()
    );
    Ok(registry)
}
