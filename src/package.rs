// src/package.rs

//! Package identity and metadata types

use crate::error::{Error, Result};
use crate::version::{PackageVersion, VersionRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A package identity: id plus exact version
///
/// Ordering is by id, then by semantic version precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageName {
    pub id: String,
    pub version: PackageVersion,
}

impl PackageName {
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Parse "id@version" or "id version"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (id, version) = s
            .split_once('@')
            .or_else(|| s.split_once(char::is_whitespace))
            .ok_or_else(|| {
                Error::InvalidRequest(format!("expected 'id@version', found '{s}'"))
            })?;

        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidRequest(format!("missing package id in '{s}'")));
        }

        Ok(Self::new(id, PackageVersion::parse(version)?))
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A dependency on another package id within a version range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    pub id: String,
    #[serde(default = "any_range")]
    pub range: VersionRange,
}

fn any_range() -> VersionRange {
    VersionRange::Any
}

impl PackageDependency {
    pub fn new(id: impl Into<String>, range: VersionRange) -> Self {
        Self {
            id: id.into(),
            range,
        }
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            VersionRange::Any => write!(f, "{}", self.id),
            ref range => write!(f, "{} ({})", self.id, range),
        }
    }
}

/// Registry metadata for one package version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: PackageName,
    pub dependencies: Vec<PackageDependency>,
    /// Installing this package requires the user to accept its license
    pub requires_license_acceptance: bool,
    pub license_url: Option<String>,
    pub summary: Option<String>,
}

impl PackageMetadata {
    pub fn new(name: PackageName) -> Self {
        Self {
            name,
            dependencies: Vec::new(),
            requires_license_acceptance: false,
            license_url: None,
            summary: None,
        }
    }

    pub fn with_dependency(mut self, dependency: PackageDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_license_acceptance(mut self, required: bool) -> Self {
        self.requires_license_acceptance = required;
        self
    }
}

/// Reason why a package was installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallReason {
    /// User explicitly requested this package
    #[default]
    Explicit,
    /// Installed automatically as a dependency of another package
    Dependency,
}

impl InstallReason {
    pub fn as_str(&self) -> &str {
        match self {
            InstallReason::Explicit => "explicit",
            InstallReason::Dependency => "dependency",
        }
    }
}

impl FromStr for InstallReason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(InstallReason::Explicit),
            "dependency" => Ok(InstallReason::Dependency),
            _ => Err(format!("Invalid install reason: {s}")),
        }
    }
}

/// A package recorded in the installed set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: PackageName,
    pub installed_at: DateTime<Utc>,
    pub reason: InstallReason,
}

impl InstalledPackage {
    pub fn new(name: PackageName, reason: InstallReason) -> Self {
        Self {
            name,
            installed_at: Utc::now(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_parse() {
        let name = PackageName::parse("Newtonsoft.Json@13.0.1").unwrap();
        assert_eq!(name.id, "Newtonsoft.Json");
        assert_eq!(name.version, PackageVersion::new(13, 0, 1));

        let spaced = PackageName::parse("Serilog 2.10").unwrap();
        assert_eq!(spaced.to_string(), "Serilog@2.10.0");
    }

    #[test]
    fn test_package_name_parse_errors() {
        assert!(PackageName::parse("NoVersion").is_err());
        assert!(PackageName::parse("@1.0").is_err());
        assert!(PackageName::parse("pkg@bogus").is_err());
    }

    #[test]
    fn test_package_name_ordering() {
        let a1 = PackageName::parse("a@1.0").unwrap();
        let a2 = PackageName::parse("a@2.0").unwrap();
        let b1 = PackageName::parse("b@0.1").unwrap();
        let mut names = vec![b1.clone(), a2.clone(), a1.clone()];
        names.sort();
        assert_eq!(names, vec![a1, a2, b1]);
    }

    #[test]
    fn test_install_reason_roundtrip_str() {
        for reason in [InstallReason::Explicit, InstallReason::Dependency] {
            assert_eq!(reason.as_str().parse::<InstallReason>().unwrap(), reason);
        }
        assert!("bogus".parse::<InstallReason>().is_err());
    }
}
