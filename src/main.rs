//! `speedrun-installer` command-line entry point.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::config::{cmd_config, ConfigAction};
use commands::lifecycle::{cmd_find, cmd_lifecycle, GlobalOpts, Operation};

#[derive(Parser)]
#[command(
    name = "speedrun-installer",
    about = "Installer for 140-speedrun-timer",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    /// Trace every filesystem action
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the mod
    Install,
    /// Reinstall the mod
    Reinstall,
    /// Uninstall the mod
    Uninstall,
    /// Check whether the mod is installed
    Check,
    /// Attempts to find the path where 140 is installed
    Find,
    /// Manage installer configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Install => cmd_lifecycle(Operation::Install, &cli.global)?,
        Commands::Reinstall => cmd_lifecycle(Operation::Reinstall, &cli.global)?,
        Commands::Uninstall => cmd_lifecycle(Operation::Uninstall, &cli.global)?,
        Commands::Check => cmd_lifecycle(Operation::Check, &cli.global)?,
        Commands::Find => cmd_find(&cli.global)?,
        Commands::Config { action } => cmd_config(action)?,
    }

    Ok(())
}

/// Warnings only by default; `--verbose` traces each filesystem action.
/// `RUST_LOG` overrides both.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,speedrun_installer=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
