// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use commands::Settings;
use std::io;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("depplan {}", env!("CARGO_PKG_VERSION"));
        println!("Run 'depplan --help' for usage information");
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "depplan", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::from_args(&cli.global)?;

    match command {
        Commands::Init => commands::cmd_init(&settings),
        Commands::List => commands::cmd_list(&settings),
        Commands::Resolve {
            action,
            package,
            version,
            json,
        } => commands::cmd_resolve(&settings, &action, &package, version.as_deref(), json),
        Commands::Preview {
            action,
            package,
            version,
            json,
        } => commands::cmd_preview(&settings, &action, &package, version.as_deref(), json),
        Commands::Install {
            package,
            version,
            yes,
            dry_run,
        } => commands::cmd_install(&settings, &package, version.as_deref(), yes, dry_run),
        Commands::Uninstall {
            package,
            version,
            yes,
            keep_dependencies,
            dry_run,
        } => commands::cmd_uninstall(
            &settings,
            &package,
            version.as_deref(),
            yes,
            keep_dependencies,
            dry_run,
        ),
        Commands::Console { script } => commands::cmd_console(&settings, script.as_deref()),
        Commands::Completions { .. } => Ok(()),
    }
}
