use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use speedrun_installer::{Config, InstallationManager, PathResolver, Payload, Settings};

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalOpts {
    /// Manually specify where 140 is installed
    #[arg(short, long, global = true, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Directory holding payload.toml and the files/ tree to install
    #[arg(long, global = true, value_name = "DIR")]
    pub payload: Option<PathBuf>,
}

#[derive(Clone, Copy)]
pub enum Operation {
    Install,
    Reinstall,
    Uninstall,
    Check,
}

pub fn cmd_lifecycle(op: Operation, opts: &GlobalOpts) -> Result<()> {
    let config = Config::load_or_default()?;
    let settings = settings(opts, &config);

    let payload_dir = opts
        .payload
        .clone()
        .or_else(|| config.payload.dir.clone())
        .or_else(Payload::default_dir)
        .context("Could not determine the payload directory; pass --payload <dir>")?;
    let payload = Payload::load(&payload_dir)?;

    let manager = InstallationManager::new(PathResolver::platform(&config.game.search_dirs), payload);
    match op {
        Operation::Install => println!("{}", manager.install(&settings)?),
        Operation::Reinstall => println!("{}", manager.reinstall(&settings)?),
        Operation::Uninstall => println!("{}", manager.uninstall(&settings)?),
        Operation::Check => println!("{}", manager.check(&settings)?),
    }
    Ok(())
}

pub fn cmd_find(opts: &GlobalOpts) -> Result<()> {
    let config = Config::load_or_default()?;
    let settings = settings(opts, &config);
    let path = PathResolver::platform(&config.game.search_dirs).resolve(&settings)?;
    println!("{path}");
    Ok(())
}

/// `--path` wins over the configured game path.
fn settings(opts: &GlobalOpts, config: &Config) -> Settings {
    Settings {
        path: opts.path.clone().or_else(|| config.game.path.clone()),
    }
}
