// src/session.rs

//! Package session: the single owner of a registry and an installed set
//!
//! Front ends (CLI, console host) hold a `Session` and go through it for
//! resolution, previews and execution. Resolution always runs against a
//! snapshot of the installed set; execution goes through the shared
//! `TrackerHandle`, which serializes concurrent executions.

use crate::error::{Error, Result};
use crate::installed::{InstalledSet, MemoryInstalledSet, TrackerHandle};
use crate::package::{PackageMetadata, PackageName};
use crate::preview::{PreviewDiff, compute_preview};
use crate::registry::PackageRegistry;
use crate::resolver::{ActionResolver, PackageActionDescription, PackageActionType, ResolverContext};
use crate::transaction::{ActionExecutor, ExecutionOptions, ExecutionReport};
use crate::version::PackageVersion;
use std::sync::Arc;
use strum_macros::EnumIter;
use tracing::{debug, info};

/// Commands a front end can offer for a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PackageCommand {
    Install,
    InstallPreview,
    Uninstall,
    UninstallPreview,
}

/// Display label for each command
const COMMAND_LABELS: &[(PackageCommand, &str)] = &[
    (PackageCommand::Install, "Install"),
    (PackageCommand::InstallPreview, "Install Preview"),
    (PackageCommand::Uninstall, "Uninstall"),
    (PackageCommand::UninstallPreview, "Uninstall Preview"),
];

impl PackageCommand {
    pub fn label(&self) -> &'static str {
        COMMAND_LABELS
            .iter()
            .find(|(command, _)| command == self)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }

    /// Look up a command by label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        COMMAND_LABELS
            .iter()
            .find(|(_, l)| l.eq_ignore_ascii_case(label))
            .map(|(command, _)| *command)
    }

    pub fn action_type(&self) -> PackageActionType {
        match self {
            PackageCommand::Install | PackageCommand::InstallPreview => PackageActionType::Install,
            PackageCommand::Uninstall | PackageCommand::UninstallPreview => {
                PackageActionType::Uninstall
            }
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(
            self,
            PackageCommand::InstallPreview | PackageCommand::UninstallPreview
        )
    }
}

/// Decides whether the licenses of a plan are accepted
pub trait LicenseGate {
    fn accept(&self, packages: &[PackageMetadata]) -> bool;
}

/// Accepts every license without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl LicenseGate for AcceptAll {
    fn accept(&self, _packages: &[PackageMetadata]) -> bool {
        true
    }
}

/// Declines every license
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl LicenseGate for DeclineAll {
    fn accept(&self, _packages: &[PackageMetadata]) -> bool {
        false
    }
}

impl<F> LicenseGate for F
where
    F: Fn(&[PackageMetadata]) -> bool,
{
    fn accept(&self, packages: &[PackageMetadata]) -> bool {
        self(packages)
    }
}

/// Result of running a `PackageCommand`
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// Preview commands: the plan and what it would change
    Preview {
        actions: Vec<PackageActionDescription>,
        diff: PreviewDiff,
    },
    /// Action commands: the plan and its execution report
    Executed {
        actions: Vec<PackageActionDescription>,
        report: ExecutionReport,
    },
    /// The license gate refused; nothing was executed
    Declined { licenses: Vec<PackageName> },
}

/// Owner of a registry and an installed set
#[derive(Clone)]
pub struct Session {
    registry: Arc<dyn PackageRegistry>,
    tracker: TrackerHandle,
    defaults: ResolverContext,
}

impl Session {
    pub fn new(registry: Arc<dyn PackageRegistry>, tracker: TrackerHandle) -> Self {
        Self {
            registry,
            tracker,
            defaults: ResolverContext::default(),
        }
    }

    /// Set the context used when a caller does not supply one
    pub fn with_defaults(mut self, defaults: ResolverContext) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ResolverContext {
        &self.defaults
    }

    pub fn registry(&self) -> &Arc<dyn PackageRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &TrackerHandle {
        &self.tracker
    }

    /// Immutable copy of the installed set
    pub fn snapshot(&self) -> Result<MemoryInstalledSet> {
        self.tracker.snapshot()
    }

    pub fn installed_version(&self, id: &str) -> Result<Option<PackageVersion>> {
        self.snapshot()?.installed_version(id)
    }

    /// Name the package a request refers to
    ///
    /// With an explicit version that version is used. Otherwise install
    /// picks the newest published version (stable only unless
    /// `allow_prerelease`) and uninstall picks the installed one.
    pub fn package_for(
        &self,
        action: PackageActionType,
        id: &str,
        version: Option<&str>,
        allow_prerelease: bool,
    ) -> Result<PackageName> {
        if id.trim().is_empty() {
            return Err(Error::InvalidRequest("missing package id".to_string()));
        }
        if let Some(version) = version {
            return Ok(PackageName::new(id, PackageVersion::parse(version)?));
        }

        match action {
            PackageActionType::Uninstall => self
                .installed_version(id)?
                .map(|v| PackageName::new(id, v))
                .ok_or_else(|| Error::PackageNotFound(format!("{id} is not installed"))),
            _ => self
                .registry
                .get_versions(id)
                .into_iter()
                .filter(|v| allow_prerelease || !v.is_prerelease())
                .max()
                .map(|v| PackageName::new(id, v))
                .ok_or_else(|| Error::PackageNotFound(id.to_string())),
        }
    }

    /// Resolve a request against a snapshot of the installed set
    pub fn resolve_actions(
        &self,
        action: PackageActionType,
        root: &PackageName,
        context: &ResolverContext,
    ) -> Result<Vec<PackageActionDescription>> {
        let snapshot = self.snapshot()?;
        ActionResolver::new(self.registry.as_ref(), &snapshot).resolve_actions(action, root, context)
    }

    /// Resolve on a blocking worker thread
    ///
    /// Cancel through the context's token; a cancelled resolution leaves the
    /// installed set untouched.
    pub async fn resolve_in_background(
        &self,
        action: PackageActionType,
        root: PackageName,
        context: ResolverContext,
    ) -> Result<Vec<PackageActionDescription>> {
        let session = self.clone();
        let handle =
            tokio::task::spawn_blocking(move || session.resolve_actions(action, &root, &context));

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(Error::Cancelled(format!("background resolution: {e}"))),
        }
    }

    /// Resolve and diff without executing
    pub fn preview(
        &self,
        action: PackageActionType,
        root: &PackageName,
        context: &ResolverContext,
    ) -> Result<(Vec<PackageActionDescription>, PreviewDiff)> {
        let snapshot = self.snapshot()?;
        let actions = ActionResolver::new(self.registry.as_ref(), &snapshot)
            .resolve_actions(action, root, context)?;
        let diff = compute_preview(&snapshot, &actions)?;
        Ok((actions, diff))
    }

    pub fn create_action_executor(&self) -> ActionExecutor {
        ActionExecutor::new(self.registry.clone(), self.tracker.clone())
    }

    /// Registry metadata for every license the plan asks to accept
    pub fn licenses_in(&self, actions: &[PackageActionDescription]) -> Vec<PackageMetadata> {
        actions
            .iter()
            .filter(|a| a.action_type == PackageActionType::AcceptLicense)
            .map(|a| {
                self.registry
                    .get_package(&a.package.id, &a.package.version)
                    .unwrap_or_else(|| PackageMetadata::new(a.package.clone()))
            })
            .collect()
    }

    /// Run a command end to end
    ///
    /// Previews resolve and diff. Action commands resolve, pass any licenses
    /// through `gate`, then execute.
    pub fn run_command(
        &self,
        command: PackageCommand,
        root: &PackageName,
        context: &ResolverContext,
        gate: &dyn LicenseGate,
        options: &ExecutionOptions,
    ) -> Result<CommandOutcome> {
        debug!("Running '{}' for {}", command.label(), root);

        if command.is_preview() {
            let (actions, diff) = self.preview(command.action_type(), root, context)?;
            return Ok(CommandOutcome::Preview { actions, diff });
        }

        let actions = self.resolve_actions(command.action_type(), root, context)?;

        let licenses = self.licenses_in(&actions);
        if !licenses.is_empty() && !gate.accept(&licenses) {
            info!("License acceptance declined for {}", root);
            return Ok(CommandOutcome::Declined {
                licenses: licenses.into_iter().map(|m| m.name).collect(),
            });
        }

        let report = self.create_action_executor().execute_with(&actions, options)?;
        Ok(CommandOutcome::Executed { actions, report })
    }

    /// Commands that apply to a package in the current state
    ///
    /// Uninstall commands when that exact version is installed, install
    /// commands otherwise.
    pub fn available_commands(&self, id: &str, version: &PackageVersion) -> Result<Vec<PackageCommand>> {
        let installed = self.installed_version(id)?;
        Ok(if installed.as_ref() == Some(version) {
            vec![PackageCommand::Uninstall, PackageCommand::UninstallPreview]
        } else {
            vec![PackageCommand::Install, PackageCommand::InstallPreview]
        })
    }
}
