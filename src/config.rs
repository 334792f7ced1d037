// src/config.rs

//! Configuration file for the depplan binary
//!
//! ```toml
//! [resolver]
//! dependency_behavior = "highest-minor"
//! allow_prerelease = false
//! remove_dependencies = true
//!
//! [paths]
//! registry = "/var/lib/depplan/registry.toml"
//! database = "/var/lib/depplan/installed.db"
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use crate::error::{Error, Result};
use crate::resolver::{DependencyBehavior, ResolverContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/depplan/config.toml";

/// Default registry feed location
pub const DEFAULT_REGISTRY_PATH: &str = "/var/lib/depplan/registry.toml";

/// Default installed-set database location
pub const DEFAULT_DATABASE_PATH: &str = "/var/lib/depplan/installed.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub paths: PathsConfig,
}

/// `[resolver]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub dependency_behavior: DependencyBehavior,
    pub allow_prerelease: bool,
    pub remove_dependencies: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dependency_behavior: DependencyBehavior::default(),
            allow_prerelease: false,
            remove_dependencies: true,
        }
    }
}

impl ResolverConfig {
    /// Resolver context carrying these settings
    pub fn context(&self) -> ResolverContext {
        ResolverContext::new(self.dependency_behavior)
            .with_prerelease(self.allow_prerelease)
            .with_remove_dependencies(self.remove_dependencies)
    }
}

/// `[paths]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub registry: PathBuf,
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from(DEFAULT_REGISTRY_PATH),
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Load the configuration file, falling back to defaults when it is absent
///
/// With `path == None` the default location is used.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        debug!("No configuration at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
