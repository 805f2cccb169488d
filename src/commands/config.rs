use anyhow::Result;
use clap::Subcommand;
use std::path::Path;
use speedrun_installer::config::Config;
use speedrun_installer::InstallationPath;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the installer settings as TOML
    Show,
    /// Print where the installer settings are stored
    Path,
    /// Create the settings file with nothing set
    Init,
    /// Remember a setting: game.path or payload.dir (an empty value forgets it)
    Set { key: String, value: String },
    /// Print one setting: game.path or payload.dir
    Get { key: String },
}

pub fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Init => {
            let path = Config::path()?;
            if path.exists() {
                println!("Installer settings already exist at {}", path.display());
            } else {
                Config::default().save_to(&path)?;
                println!("Created installer settings at {}", path.display());
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set_value(&key, &value)?;
            if key == "game.path" && !value.is_empty() {
                if let Err(reason) = InstallationPath::validate(Path::new(&value)) {
                    tracing::warn!("{value} does not look like a 140 installation: {reason}");
                }
            }
            config.save()?;
            if value.is_empty() {
                println!("Cleared {key}");
            } else {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Get { key } => {
            let value = Config::load()?.get_value(&key)?;
            if value.is_empty() {
                println!("{key} is not set");
            } else {
                println!("{value}");
            }
        }
    }
    Ok(())
}
