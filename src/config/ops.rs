use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::Config;

impl Config {
    /// Location of the config file, if a home directory is known.
    pub fn locate() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("speedrun-installer").join("config.toml"))
    }

    /// Location of the config file.
    pub fn path() -> Result<PathBuf> {
        Self::locate().context("Could not determine home directory")
    }

    /// Load the config file, or defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load the config file if there is anywhere to look for one.
    /// Operations that take everything from flags must not fail just
    /// because the home directory is unknown.
    pub fn load_or_default() -> Result<Self> {
        Self::load_optional(Self::locate().as_deref())
    }

    /// Load from `path`, or defaults when there is no path.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No home directory; using the default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Load from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Write the config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Write to an explicit file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Get a config value by dot-separated key path
    pub fn get_value(&self, key: &str) -> Result<String> {
        let path = match key {
            "game.path" => self.game.path.as_ref(),
            "payload.dir" => self.payload.dir.as_ref(),
            _ => anyhow::bail!("Unknown config key: {key}"),
        };
        Ok(path.map(|p| p.display().to_string()).unwrap_or_default())
    }

    /// Set a config value by dot-separated key path. An empty value clears it.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = if value.is_empty() { None } else { Some(PathBuf::from(value)) };
        match key {
            "game.path" => self.game.path = value,
            "payload.dir" => self.payload.dir = value,
            _ => anyhow::bail!("Unknown config key: {key}"),
        }
        Ok(())
    }
}
