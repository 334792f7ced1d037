// src/error.rs

//! Error types shared by the resolver, planner, executor, and trackers

use thiserror::Error;

/// Errors produced by depplan operations
#[derive(Debug, Error)]
pub enum Error {
    /// The requested package is absent from the registry (install) or the
    /// installed set (uninstall)
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// No available version satisfies every range imposed on a dependency
    #[error("Unable to resolve dependency '{package}': no version satisfies {constraints}")]
    UnresolvableConstraint { package: String, constraints: String },

    /// The closure's dependency graph contains a cycle
    #[error("Circular dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two actions in one plan target the same package with different action types
    #[error("Conflicting actions for package {0}")]
    ConflictingActions(String),

    /// A single action failed while being applied
    #[error("Action failed for {package}: {reason}")]
    ActionExecution { package: String, reason: String },

    /// Another execution already holds the installed set
    #[error("Another execution is already running against this installed set")]
    ConcurrentExecution,

    /// Cooperative cancellation was requested
    #[error("Operation cancelled during {0}")]
    Cancelled(String),

    /// The request itself is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A version or version range could not be parsed
    #[error("Invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    /// Configuration or feed file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
