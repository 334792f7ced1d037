// src/lib.rs

//! depplan: dependency resolution and action planning
//!
//! Given a registry of package metadata and the set of packages already
//! installed, depplan computes the ordered list of actions (license
//! acceptances, installs, uninstalls) that realizes a request, previews the
//! result, and executes the plan against the installed set.
//!
//! # Architecture
//!
//! - Resolution is pure: it reads a snapshot of the installed set and never
//!   mutates it
//! - Plans are ordered by a deterministic topological sort of the dependency
//!   closure
//! - Execution is serialized per installed set; a second concurrent executor
//!   is refused rather than queued
//! - The installed set persists in SQLite, with install reasons so that
//!   dependencies pulled in by an install are removed with it

pub mod config;
pub mod console;
pub mod db;
mod error;
pub mod installed;
pub mod package;
pub mod preview;
pub mod progress;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod transaction;
pub mod version;

pub use error::{Error, Result};
pub use installed::{InstalledSet, MemoryInstalledSet, TrackerHandle};
pub use package::{
    InstallReason, InstalledPackage, PackageDependency, PackageMetadata, PackageName,
};
pub use preview::{PackageStatus, PreviewDiff, compute_preview};
pub use progress::{CallbackProgress, LogProgress, ProgressEvent, ProgressTracker, SilentProgress};
pub use registry::{MemoryRegistry, PackageRegistry};
pub use resolver::{
    ActionResolver, DependencyBehavior, PackageActionDescription, PackageActionType,
    ResolverContext,
};
pub use session::{CommandOutcome, LicenseGate, PackageCommand, Session};
pub use transaction::{ActionExecutor, ActionState, ExecutionOptions, ExecutionReport};
pub use version::{PackageVersion, VersionRange};
