// src/commands/mod.rs
//! Command handlers for the depplan CLI

pub mod progress;

use crate::cli::GlobalArgs;
use anyhow::{Context, Result, bail};
use depplan::config::{self, Config};
use depplan::console::ConsoleHost;
use depplan::db::{self, ExecutionLock, SqliteInstalledSet};
use depplan::registry::load_feed;
use depplan::{
    ActionState, ExecutionOptions, ExecutionReport, InstalledSet, LogProgress,
    PackageActionDescription, PackageActionType, PackageName, ProgressTracker, ResolverContext,
    Session, TrackerHandle,
};
use progress::CliProgress;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Settings after merging the config file with command-line overrides
pub struct Settings {
    pub db_path: PathBuf,
    pub registry_path: PathBuf,
    pub context: ResolverContext,
}

impl Settings {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let config: Config = config::load(args.config.as_deref())?;

        let mut context = config.resolver.context();
        if let Some(behavior) = args.behavior {
            context.dependency_behavior = behavior;
        }
        if args.prerelease {
            context.allow_prerelease = true;
        }

        Ok(Self {
            db_path: args.db_path.clone().unwrap_or(config.paths.database),
            registry_path: args.registry.clone().unwrap_or(config.paths.registry),
            context,
        })
    }

    fn db_path_str(&self) -> Result<&str> {
        self.db_path
            .to_str()
            .with_context(|| format!("Database path is not UTF-8: {}", self.db_path.display()))
    }

    /// Load the registry feed and open the installed set
    fn session(&self) -> Result<Session> {
        let registry = load_feed(&self.registry_path).with_context(|| {
            format!("Failed to load registry {}", self.registry_path.display())
        })?;
        let installed = SqliteInstalledSet::open(self.db_path_str()?)
            .context("Failed to open installed-set database")?;

        Ok(Session::new(Arc::new(registry), TrackerHandle::new(installed))
            .with_defaults(self.context.clone()))
    }
}

fn parse_action(action: &str) -> Result<PackageActionType> {
    match action.parse::<PackageActionType>() {
        Ok(PackageActionType::AcceptLicense) | Err(_) => {
            bail!("Unknown action '{}': expected install or uninstall", action)
        }
        Ok(action) => Ok(action),
    }
}

/// Ask a yes/no question on stdin; anything but y/yes is no
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn print_plan(actions: &[PackageActionDescription]) {
    if actions.is_empty() {
        println!("Nothing to do.");
        return;
    }
    for (index, action) in actions.iter().enumerate() {
        println!("{:>3}. {}", index + 1, action);
    }
}

/// Execute a plan under the cross-process lock
///
/// Progress is a bar on a terminal and log lines otherwise.
fn execute(
    settings: &Settings,
    session: &Session,
    actions: &[PackageActionDescription],
    operation: &str,
) -> Result<ExecutionReport> {
    let _lock = ExecutionLock::try_acquire(&settings.db_path)
        .context("Another depplan process is executing against this database")?;

    let progress: Arc<dyn ProgressTracker> = if io::stderr().is_terminal() {
        Arc::new(CliProgress::new(operation))
    } else {
        Arc::new(LogProgress::new(operation))
    };
    let options = ExecutionOptions::new().with_progress(progress);
    let report = session
        .create_action_executor()
        .execute_with(actions, &options)?;
    Ok(report)
}

fn finish(report: &ExecutionReport) -> Result<()> {
    for outcome in &report.outcomes {
        let state = match &outcome.state {
            ActionState::Committed => "done".to_string(),
            ActionState::Failed(reason) => format!("FAILED: {reason}"),
            ActionState::Pending | ActionState::Applying => "not attempted".to_string(),
        };
        println!("  {}: {}", outcome.action, state);
    }

    if let Some(failed) = report.failure() {
        let committed = report.committed().count();
        bail!(
            "{} failed after {} of {} action(s) were committed",
            failed.action,
            committed,
            report.outcomes.len()
        );
    }
    if report.cancelled {
        bail!("Execution was cancelled");
    }
    Ok(())
}

/// Gate license acceptance through the user unless `yes` was given
fn accept_licenses(session: &Session, actions: &[PackageActionDescription], yes: bool) -> Result<bool> {
    let licenses = session.licenses_in(actions);
    if licenses.is_empty() || yes {
        return Ok(true);
    }

    println!("The following packages require license acceptance:");
    for meta in &licenses {
        match &meta.license_url {
            Some(url) => println!("  {} ({})", meta.name, url),
            None => println!("  {}", meta.name),
        }
    }
    confirm("Accept these licenses?")
}

pub fn cmd_init(settings: &Settings) -> Result<()> {
    let db_path = settings.db_path_str()?;
    info!("Initializing depplan database at: {}", db_path);
    db::init(db_path)?;
    println!("Database initialized at: {}", db_path);
    Ok(())
}

pub fn cmd_list(settings: &Settings) -> Result<()> {
    let installed = SqliteInstalledSet::open(settings.db_path_str()?)
        .context("Failed to open installed-set database")?;
    let packages = installed.get_installed()?;

    if packages.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }
    for package in packages {
        println!(
            "{:<40} {:<10} {}",
            package.name.to_string(),
            package.reason.as_str(),
            package.installed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn root_for(
    session: &Session,
    action: PackageActionType,
    package: &str,
    version: Option<&str>,
) -> Result<PackageName> {
    Ok(session.package_for(
        action,
        package,
        version,
        session.defaults().allow_prerelease,
    )?)
}

pub fn cmd_resolve(
    settings: &Settings,
    action: &str,
    package: &str,
    version: Option<&str>,
    json: bool,
) -> Result<()> {
    let action = parse_action(action)?;
    let session = settings.session()?;
    let root = root_for(&session, action, package, version)?;

    let actions = session.resolve_actions(action, &root, session.defaults())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else {
        print_plan(&actions);
    }
    Ok(())
}

pub fn cmd_preview(
    settings: &Settings,
    action: &str,
    package: &str,
    version: Option<&str>,
    json: bool,
) -> Result<()> {
    let action = parse_action(action)?;
    let session = settings.session()?;
    let root = root_for(&session, action, package, version)?;

    let (_, diff) = session.preview(action, &root, session.defaults())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        print!("{diff}");
    }
    Ok(())
}

pub fn cmd_install(
    settings: &Settings,
    package: &str,
    version: Option<&str>,
    yes: bool,
    dry_run: bool,
) -> Result<()> {
    let session = settings.session()?;
    let root = root_for(&session, PackageActionType::Install, package, version)?;
    info!(
        "Installing {} (dependency behavior: {})",
        root,
        session.defaults().dependency_behavior
    );

    let actions = session.resolve_actions(PackageActionType::Install, &root, session.defaults())?;
    print_plan(&actions);
    if dry_run || actions.is_empty() {
        return Ok(());
    }

    if !accept_licenses(&session, &actions, yes)? {
        bail!("License acceptance declined; nothing was installed");
    }

    let report = execute(settings, &session, &actions, "Installing")?;
    finish(&report)?;
    println!("Installed {}", root);
    Ok(())
}

pub fn cmd_uninstall(
    settings: &Settings,
    package: &str,
    version: Option<&str>,
    yes: bool,
    keep_dependencies: bool,
    dry_run: bool,
) -> Result<()> {
    let session = settings.session()?;
    let root = root_for(&session, PackageActionType::Uninstall, package, version)?;
    let context = session
        .defaults()
        .clone()
        .with_remove_dependencies(!keep_dependencies);

    let actions = session.resolve_actions(PackageActionType::Uninstall, &root, &context)?;
    print_plan(&actions);
    if dry_run || actions.is_empty() {
        return Ok(());
    }

    let extra: Vec<&PackageName> = actions
        .iter()
        .map(|a| &a.package)
        .filter(|p| **p != root)
        .collect();
    if !extra.is_empty() && !yes {
        println!(
            "Removing {} also removes {} other package(s).",
            root,
            extra.len()
        );
        if !confirm("Continue?")? {
            bail!("Uninstall cancelled; nothing was removed");
        }
    }

    let report = execute(settings, &session, &actions, "Removing")?;
    finish(&report)?;
    println!("Uninstalled {}", root);
    Ok(())
}

/// Run the console host over stdin, or over a script file
pub fn cmd_console(settings: &Settings, script: Option<&Path>) -> Result<()> {
    let session = settings.session()?;
    let _lock = ExecutionLock::try_acquire(&settings.db_path)
        .context("Another depplan process is executing against this database")?;

    let mut host = ConsoleHost::new(session, io::stdout());
    let interactive = script.is_none();

    let reader: Box<dyn BufRead> = match script {
        Some(path) => Box::new(io::BufReader::new(
            std::fs::File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    if interactive {
        print!("depplan> ");
        io::stdout().flush()?;
    }
    for line in reader.lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        host.execute(&line);
        if interactive {
            print!("depplan> ");
            io::stdout().flush()?;
        }
    }

    let failed = host.history().iter().filter(|e| !e.succeeded).count();
    if !interactive && failed > 0 {
        bail!("{} console command(s) failed", failed);
    }
    Ok(())
}
