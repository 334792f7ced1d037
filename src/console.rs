// src/console.rs

//! Line-oriented console host
//!
//! Each input line is one command run against a `Session`. Failures are
//! written to the output, logged, and recorded in the history; they never
//! escape `execute`, so one bad command cannot take the host down.
//!
//! Commands:
//!
//! ```text
//! install <id> [version] [--behavior <b>] [--prerelease] [--accept-licenses]
//! uninstall <id> [version] [--keep-dependencies]
//! preview-install <id> [version] [...]     (also: preview install ...)
//! preview-uninstall <id> [version] [...]   (also: preview uninstall ...)
//! list
//! history [clear]
//! help
//! ```
//!
//! The history keeps the most recent `DEFAULT_HISTORY_LIMIT` entries unless
//! the host is built with another limit.
//!
//! A version may also be given as `id@version`. Without a version, install
//! picks the newest published version and uninstall the installed one.

use crate::error::{Error, Result};
use crate::installed::InstalledSet;
use crate::package::PackageName;
use crate::resolver::{DependencyBehavior, ResolverContext};
use crate::session::{AcceptAll, CommandOutcome, DeclineAll, LicenseGate, PackageCommand, Session};
use crate::transaction::{ActionState, ExecutionOptions};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use tracing::{error, info};

/// Console verbs and the command each one runs
const VERBS: &[(&str, PackageCommand)] = &[
    ("install", PackageCommand::Install),
    ("uninstall", PackageCommand::Uninstall),
    ("preview-install", PackageCommand::InstallPreview),
    ("preview-uninstall", PackageCommand::UninstallPreview),
];

const HELP: &str = "\
Commands:
  install <id> [version] [--behavior <b>] [--prerelease] [--accept-licenses]
  uninstall <id> [version] [--keep-dependencies]
  preview-install <id> [version] [options]
  preview-uninstall <id> [version] [options]
  list
  history [clear]
  help
Behaviors: ignore, lowest, highest-patch, highest-minor, highest";

/// History entries kept before the oldest are dropped
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// One executed console command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// A package command parsed from one console line
#[derive(Debug)]
struct PackageRequest {
    command: PackageCommand,
    id: String,
    version: Option<String>,
    context: ResolverContext,
    accept_licenses: bool,
}

/// Console host writing its output to `W`
pub struct ConsoleHost<W: Write> {
    session: Session,
    out: W,
    history: Vec<HistoryEntry>,
    history_limit: usize,
}

impl<W: Write> ConsoleHost<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self {
            session,
            out,
            history: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Keep at most `limit` history entries
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(self.history_limit);
        self.history.drain(..excess);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Hand back the output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run one line; returns whether it succeeded
    ///
    /// Blank lines and `#` comments are ignored and not recorded.
    pub fn execute(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return true;
        }

        let started_at = Utc::now();
        let result = self.run(line);

        let entry = match result {
            Ok(()) => HistoryEntry {
                command: line.to_string(),
                started_at,
                succeeded: true,
                error: None,
            },
            Err(e) => {
                error!("Console command '{}' failed: {}", line, e);
                if let Err(write_err) = writeln!(self.out, "error: {e}") {
                    error!("Failed to write console output: {}", write_err);
                }
                HistoryEntry {
                    command: line.to_string(),
                    started_at,
                    succeeded: false,
                    error: Some(e.to_string()),
                }
            }
        };

        let succeeded = entry.succeeded;
        self.history.push(entry);
        self.trim_history();
        succeeded
    }

    fn run(&mut self, line: &str) -> Result<()> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            ["help"] => {
                writeln!(self.out, "{HELP}")?;
                Ok(())
            }
            ["list"] => self.list(),
            ["history"] => self.print_history(),
            ["history", "clear"] => {
                self.clear_history();
                Ok(())
            }
            ["preview", verb, rest @ ..] => {
                let verb = format!("preview-{verb}");
                self.package_command(&verb, rest)
            }
            [verb, rest @ ..] => self.package_command(verb, rest),
            [] => Ok(()),
        }
    }

    fn list(&mut self) -> Result<()> {
        let installed = self.session.snapshot()?.get_installed()?;
        if installed.is_empty() {
            writeln!(self.out, "No packages installed.")?;
        }
        for package in installed {
            writeln!(
                self.out,
                "{} ({}, installed {})",
                package.name,
                package.reason.as_str(),
                package.installed_at.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        for (index, entry) in self.history.iter().enumerate() {
            let status = if entry.succeeded { "ok" } else { "failed" };
            writeln!(self.out, "{:>4}  {:<6}  {}", index + 1, status, entry.command)?;
        }
        Ok(())
    }

    fn package_command(&mut self, verb: &str, args: &[&str]) -> Result<()> {
        let command = VERBS
            .iter()
            .find(|(v, _)| v.eq_ignore_ascii_case(verb))
            .map(|(_, command)| *command)
            .ok_or_else(|| {
                Error::InvalidRequest(format!("unknown command '{verb}' (try 'help')"))
            })?;

        let request = parse_request(command, args, self.session.defaults())?;
        let root = self.resolve_root(&request)?;
        info!("Console: {} {}", command.label(), root);

        let gate: &dyn LicenseGate = if request.accept_licenses {
            &AcceptAll
        } else {
            &DeclineAll
        };

        let outcome = self.session.run_command(
            request.command,
            &root,
            &request.context,
            gate,
            &ExecutionOptions::default(),
        )?;

        match outcome {
            CommandOutcome::Preview { actions, diff } => {
                for action in &actions {
                    writeln!(self.out, "{action}")?;
                }
                write!(self.out, "{diff}")?;
                Ok(())
            }
            CommandOutcome::Declined { licenses } => {
                let names: Vec<String> = licenses.iter().map(ToString::to_string).collect();
                writeln!(
                    self.out,
                    "License acceptance required for: {}",
                    names.join(", ")
                )?;
                writeln!(self.out, "Re-run with --accept-licenses to continue.")?;
                Err(Error::InvalidRequest("license acceptance declined".to_string()))
            }
            CommandOutcome::Executed { actions, report } => {
                if actions.is_empty() {
                    writeln!(self.out, "Nothing to do.")?;
                }
                for outcome in &report.outcomes {
                    let state = match &outcome.state {
                        ActionState::Committed => "done".to_string(),
                        ActionState::Failed(reason) => format!("failed: {reason}"),
                        ActionState::Pending | ActionState::Applying => "skipped".to_string(),
                    };
                    writeln!(self.out, "{}: {}", outcome.action, state)?;
                }
                match report.failure().and_then(|o| o.error()) {
                    Some(e) => Err(e),
                    None if report.cancelled => Err(Error::Cancelled("execution".to_string())),
                    None => Ok(()),
                }
            }
        }
    }

    fn resolve_root(&self, request: &PackageRequest) -> Result<PackageName> {
        self.session.package_for(
            request.command.action_type(),
            &request.id,
            request.version.as_deref(),
            request.context.allow_prerelease,
        )
    }
}

fn parse_request(
    command: PackageCommand,
    args: &[&str],
    defaults: &ResolverContext,
) -> Result<PackageRequest> {
    let mut positional = Vec::new();
    let mut context = defaults.clone();
    let mut accept_licenses = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match *arg {
            "--behavior" | "-b" => {
                let value = iter.next().ok_or_else(|| {
                    Error::InvalidRequest("--behavior needs a value".to_string())
                })?;
                context.dependency_behavior = value.parse::<DependencyBehavior>().map_err(|_| {
                    Error::InvalidRequest(format!("unknown dependency behavior '{value}'"))
                })?;
            }
            "--prerelease" => context.allow_prerelease = true,
            "--accept-licenses" | "-y" => accept_licenses = true,
            "--keep-dependencies" => context.remove_dependencies = false,
            flag if flag.starts_with('-') => {
                return Err(Error::InvalidRequest(format!("unknown option '{flag}'")));
            }
            value => positional.push(value),
        }
    }

    let (id, version) = match positional.as_slice() {
        [spec] => match spec.split_once('@') {
            Some((id, version)) => (id.to_string(), Some(version.to_string())),
            None => (spec.to_string(), None),
        },
        [id, version] => (id.to_string(), Some(version.to_string())),
        _ => {
            return Err(Error::InvalidRequest(format!(
                "usage: {} <id> [version]",
                command.label().to_lowercase()
            )));
        }
    };

    Ok(PackageRequest {
        command,
        id,
        version,
        context,
        accept_licenses,
    })
}
