// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: package id
fn package_arg() -> Arg {
    Arg::new("package").required(true).help("Package id")
}

/// Common argument: optional version
fn version_arg() -> Arg {
    Arg::new("version").help("Package version")
}

fn action_arg() -> Arg {
    Arg::new("action")
        .required(true)
        .value_parser(["install", "uninstall"])
        .help("Action to resolve")
}

fn build_cli() -> Command {
    Command::new("depplan")
        .version(env!("CARGO_PKG_VERSION"))
        .author("depplan contributors")
        .about("Resolve, plan and apply package installs and uninstalls")
        .subcommand_required(false)
        .arg(Arg::new("config").short('c').long("config").global(true).help("Configuration file"))
        .arg(Arg::new("db_path").short('d').long("db-path").global(true).help("Installed-set database"))
        .arg(Arg::new("registry").short('r').long("registry").global(true).help("Registry feed (TOML)"))
        .arg(
            Arg::new("behavior")
                .short('b')
                .long("behavior")
                .global(true)
                .value_parser(["ignore", "lowest", "highest-patch", "highest-minor", "highest"])
                .help("Dependency version selection"),
        )
        .arg(
            Arg::new("prerelease")
                .long("prerelease")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Allow prerelease versions of dependencies"),
        )
        .subcommand(Command::new("init").about("Create the installed-set database"))
        .subcommand(Command::new("list").about("List installed packages"))
        .subcommand(
            Command::new("resolve")
                .about("Show the actions a request would produce")
                .arg(action_arg())
                .arg(package_arg())
                .arg(version_arg())
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Print the plan as JSON")),
        )
        .subcommand(
            Command::new("preview")
                .about("Show how a request would change the installed set")
                .arg(action_arg())
                .arg(package_arg())
                .arg(version_arg())
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Print the diff as JSON")),
        )
        .subcommand(
            Command::new("install")
                .about("Install a package and its dependencies")
                .arg(package_arg())
                .arg(version_arg())
                .arg(Arg::new("yes").short('y').long("yes").action(ArgAction::SetTrue).help("Accept licenses without prompting"))
                .arg(Arg::new("dry_run").long("dry-run").action(ArgAction::SetTrue).help("Show the plan without executing it")),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Uninstall a package")
                .arg(package_arg())
                .arg(version_arg())
                .arg(Arg::new("yes").short('y').long("yes").action(ArgAction::SetTrue).help("Do not ask before removing dependents"))
                .arg(
                    Arg::new("keep_dependencies")
                        .long("keep-dependencies")
                        .action(ArgAction::SetTrue)
                        .help("Leave dependencies installed"),
                )
                .arg(Arg::new("dry_run").long("dry-run").action(ArgAction::SetTrue).help("Show the plan without executing it")),
        )
        .subcommand(
            Command::new("console")
                .about("Interactive console, one command per line")
                .arg(Arg::new("script").long("script").help("Read commands from a file instead of stdin")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("depplan.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
