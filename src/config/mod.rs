//! Persistent installer preferences in `~/.config/speedrun-installer/config.toml`.

mod ops;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration, stored as TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where to find the game.
    pub game: GameConfig,
    /// Where to find the add-on files.
    pub payload: PayloadConfig,
}

/// `[game]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Game directory to use when `--path` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Extra directories to scan during discovery
    pub search_dirs: Vec<PathBuf>,
}

/// `[payload]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Payload directory to use when `--payload` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}
