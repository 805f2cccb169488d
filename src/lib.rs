//! Installation state manager for the 140 speedrun timer: finds the game,
//! inspects what is installed, and installs, updates, repairs or removes the
//! add-on without leaving the game directory half-modified.

pub mod config;
pub mod error;
pub mod hash;
pub mod inspect;
pub mod locate;
pub mod manager;
pub mod manifest;
pub mod payload;
pub mod settings;
pub mod transact;
pub mod version;

#[cfg(test)]
mod testutil;

pub use config::Config;
pub use error::{Error, Result};
pub use inspect::{InstallationState, Inspector};
pub use locate::{InstallationPath, PathResolver};
pub use manager::{InstallationManager, Outcome, Report};
pub use payload::Payload;
pub use settings::Settings;
