// src/cli.rs
//! CLI definitions for depplan
//!
//! Argument parsing only. The handlers live in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use depplan::DependencyBehavior;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "depplan")]
#[command(author = "depplan contributors")]
#[command(version)]
#[command(about = "Resolve, plan and apply package installs and uninstalls", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every subcommand; each overrides the config file
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Installed-set database
    #[arg(short, long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Registry feed (TOML)
    #[arg(short, long, global = true)]
    pub registry: Option<PathBuf>,

    /// Dependency version selection: ignore, lowest, highest-patch, highest-minor, highest
    #[arg(short, long, global = true)]
    pub behavior: Option<DependencyBehavior>,

    /// Allow prerelease versions of dependencies
    #[arg(long, global = true)]
    pub prerelease: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the installed-set database
    Init,

    /// List installed packages
    List,

    /// Show the actions a request would produce
    Resolve {
        /// install or uninstall
        action: String,

        /// Package id
        package: String,

        /// Package version (newest for install, installed for uninstall)
        version: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a request would change the installed set
    Preview {
        /// install or uninstall
        action: String,

        /// Package id
        package: String,

        /// Package version
        version: Option<String>,

        /// Print the diff as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install a package and its dependencies
    Install {
        /// Package id
        package: String,

        /// Package version (newest stable if omitted)
        version: Option<String>,

        /// Accept licenses without prompting
        #[arg(short, long)]
        yes: bool,

        /// Show what would be installed without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Uninstall a package
    Uninstall {
        /// Package id
        package: String,

        /// Package version (the installed one if omitted)
        version: Option<String>,

        /// Do not ask before removing dependents
        #[arg(short, long)]
        yes: bool,

        /// Leave dependencies installed
        #[arg(long)]
        keep_dependencies: bool,

        /// Show what would be removed without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Interactive console, one command per line
    Console {
        /// Read commands from a file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
