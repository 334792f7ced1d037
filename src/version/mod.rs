// src/version/mod.rs

//! Version handling and range satisfaction for package dependencies
//!
//! Package versions follow semantic versioning precedence. Parsing is lenient
//! about missing components ("1.5" is "1.5.0") because package feeds commonly
//! publish two-part versions. Ranges accept both operator syntax
//! (">= 1.0, < 2.0") and interval notation ("[1.0,2.0)").

use crate::error::{Error, Result};
use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

fn parse_error(input: &str, reason: impl Into<String>) -> Error {
    Error::VersionParse {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// A semantic package version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageVersion(Version);

impl PackageVersion {
    /// Create a release version from its numeric components
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse a version string
    ///
    /// Format: major[.minor[.patch]][-prerelease][+build]
    /// Examples:
    /// - "1" → 1.0.0
    /// - "1.5" → 1.5.0
    /// - "2.0.0-beta.1" → 2.0.0 with pre-release "beta.1"
    pub fn parse(s: &str) -> Result<Self> {
        let input = s.trim();
        if input.is_empty() {
            return Err(parse_error(s, "empty version"));
        }

        let (rest, build) = match input.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (input, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(parse_error(s, "expected at most three numeric components"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u64>()
                .map_err(|e| parse_error(s, format!("invalid component '{part}': {e}")))?;
        }

        let mut version = Version::new(numbers[0], numbers[1], numbers[2]);
        if let Some(pre) = pre {
            version.pre = Prerelease::new(pre).map_err(|e| parse_error(s, e.to_string()))?;
        }
        if let Some(build) = build {
            version.build = BuildMetadata::new(build).map_err(|e| parse_error(s, e.to_string()))?;
        }

        Ok(Self(version))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Whether this version carries a pre-release tag
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// Access the underlying semver value
    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for PackageVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PackageVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PackageVersion> for String {
    fn from(value: PackageVersion) -> Self {
        value.to_string()
    }
}

/// A predicate over the versions a dependency accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionRange {
    /// Any version is acceptable
    Any,
    /// Exact version match
    Exact(PackageVersion),
    /// Greater than
    GreaterThan(PackageVersion),
    /// Greater than or equal
    GreaterOrEqual(PackageVersion),
    /// Less than
    LessThan(PackageVersion),
    /// Less than or equal
    LessOrEqual(PackageVersion),
    /// Not equal
    NotEqual(PackageVersion),
    /// Both ranges must be satisfied
    And(Box<VersionRange>, Box<VersionRange>),
}

impl VersionRange {
    /// Parse a version range string
    ///
    /// Examples:
    /// - ">= 1.2.3" → GreaterOrEqual(1.2.3)
    /// - ">= 1.0, < 2.0" → And(GreaterOrEqual(1.0), LessThan(2.0))
    /// - "[1.0,2.0)" → And(GreaterOrEqual(1.0), LessThan(2.0))
    /// - "(1.0,)" → GreaterThan(1.0)
    /// - "[1.5]" → Exact(1.5)
    /// - "1.5" → Exact(1.5)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionRange::Any);
        }

        if s.starts_with('[') || s.starts_with('(') {
            return Self::parse_interval(s);
        }

        if s.contains(',') {
            let mut parts = s.split(',').map(str::trim).filter(|p| !p.is_empty());
            let first = parts
                .next()
                .ok_or_else(|| parse_error(s, "empty range list"))?;
            let mut range = Self::parse_single(first)?;
            for part in parts {
                range = VersionRange::And(Box::new(range), Box::new(Self::parse_single(part)?));
            }
            return Ok(range);
        }

        Self::parse_single(s)
    }

    fn parse_single(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionRange::GreaterOrEqual(PackageVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix("<=") {
            Ok(VersionRange::LessOrEqual(PackageVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix("!=") {
            Ok(VersionRange::NotEqual(PackageVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(VersionRange::GreaterThan(PackageVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(VersionRange::LessThan(PackageVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('=') {
            Ok(VersionRange::Exact(PackageVersion::parse(rest)?))
        } else {
            // No operator means exact match
            Ok(VersionRange::Exact(PackageVersion::parse(s)?))
        }
    }

    /// Parse interval notation: `[` / `(` for inclusive / exclusive bounds,
    /// an empty side for an open bound
    fn parse_interval(s: &str) -> Result<Self> {
        let lower_inclusive = s.starts_with('[');
        let upper_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(parse_error(s, "interval must end with ']' or ')'")),
        };
        if s.len() < 2 {
            return Err(parse_error(s, "empty interval"));
        }
        let inner = &s[1..s.len() - 1];

        let Some((low, high)) = inner.split_once(',') else {
            if !(lower_inclusive && upper_inclusive) {
                return Err(parse_error(s, "exact interval must use '[' and ']'"));
            }
            return Ok(VersionRange::Exact(PackageVersion::parse(inner)?));
        };

        let (low, high) = (low.trim(), high.trim());
        let lower = if low.is_empty() {
            None
        } else {
            let v = PackageVersion::parse(low)?;
            Some(if lower_inclusive {
                VersionRange::GreaterOrEqual(v)
            } else {
                VersionRange::GreaterThan(v)
            })
        };
        let upper = if high.is_empty() {
            None
        } else {
            let v = PackageVersion::parse(high)?;
            Some(if upper_inclusive {
                VersionRange::LessOrEqual(v)
            } else {
                VersionRange::LessThan(v)
            })
        };

        Ok(match (lower, upper) {
            (Some(l), Some(u)) => VersionRange::And(Box::new(l), Box::new(u)),
            (Some(bound), None) | (None, Some(bound)) => bound,
            (None, None) => VersionRange::Any,
        })
    }

    /// Check if a version satisfies this range
    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        match self {
            VersionRange::Any => true,
            VersionRange::Exact(v) => version == v,
            VersionRange::GreaterThan(v) => version > v,
            VersionRange::GreaterOrEqual(v) => version >= v,
            VersionRange::LessThan(v) => version < v,
            VersionRange::LessOrEqual(v) => version <= v,
            VersionRange::NotEqual(v) => version != v,
            VersionRange::And(left, right) => left.satisfies(version) && right.satisfies(version),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::Any => write!(f, "*"),
            VersionRange::Exact(v) => write!(f, "= {}", v),
            VersionRange::GreaterThan(v) => write!(f, "> {}", v),
            VersionRange::GreaterOrEqual(v) => write!(f, ">= {}", v),
            VersionRange::LessThan(v) => write!(f, "< {}", v),
            VersionRange::LessOrEqual(v) => write!(f, "<= {}", v),
            VersionRange::NotEqual(v) => write!(f, "!= {}", v),
            VersionRange::And(left, right) => write!(f, "{}, {}", left, right),
        }
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}
