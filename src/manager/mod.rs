//! The four public operations: check, install, uninstall, reinstall.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::inspect::{InstallationState, Inspector};
use crate::locate::{InstallationPath, PathResolver};
use crate::payload::Payload;
use crate::settings::Settings;
use crate::transact::FileTransactor;
use crate::version::VersionInfo;


/// Result of a `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Where 140 was found.
    pub path: InstallationPath,
    /// What the inspector saw there.
    pub state: InstallationState,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Speedrun timer is {} in {}", self.state, self.path)
    }
}

/// Result of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Install found the current version already in place.
    AlreadyInstalled {
        /// Game directory.
        path: InstallationPath,
        /// Installed version.
        version: VersionInfo,
    },
    /// Install wrote the payload.
    Installed {
        /// Game directory.
        path: InstallationPath,
        /// Version now installed.
        version: VersionInfo,
        /// State before the install.
        previous: InstallationState,
    },
    /// Uninstall found nothing to remove.
    NotInstalled {
        /// Game directory.
        path: InstallationPath,
    },
    /// Uninstall removed the add-on.
    Uninstalled {
        /// Game directory.
        path: InstallationPath,
    },
    /// Reinstall finished.
    Reinstalled {
        /// Game directory.
        path: InstallationPath,
        /// Version now installed.
        version: VersionInfo,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled { path, version } => {
                write!(f, "Speedrun timer {version} is already installed in {path}")
            }
            Self::Installed { path, version, previous } => match previous {
                InstallationState::Absent => write!(f, "Installed speedrun timer {version} in {path}"),
                InstallationState::Outdated { installed, .. } => {
                    write!(f, "Updated speedrun timer {installed} -> {version} in {path}")
                }
                _ => write!(f, "Repaired speedrun timer {version} in {path}"),
            },
            Self::NotInstalled { path } => write!(f, "Speedrun timer is not installed in {path}"),
            Self::Uninstalled { path } => write!(f, "Uninstalled speedrun timer from {path}"),
            Self::Reinstalled { path, version } => {
                write!(f, "Reinstalled speedrun timer {version} in {path}")
            }
        }
    }
}

/// Orchestrates discovery, inspection and file transactions.
#[derive(Debug)]
pub struct InstallationManager {
    resolver: PathResolver,
    payload: Payload,
}

impl InstallationManager {
    /// Manager distributing `payload`, locating the game with `resolver`.
    pub const fn new(resolver: PathResolver, payload: Payload) -> Self {
        Self { resolver, payload }
    }

    /// The bundled payload.
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Resolve the game directory.
    pub fn find(&self, settings: &Settings) -> Result<InstallationPath> {
        Ok(self.resolver.resolve(settings)?)
    }

    /// Report the current state without changing anything.
    pub fn check(&self, settings: &Settings) -> Result<Report> {
        let path = self.find(settings)?;
        let inspector = self.inspector();
        for entry in inspector.read_manifest(path.as_path()) {
            debug!(
                "Recorded {}{}",
                entry.relative_path,
                if entry.is_backup_of_original { " (original backed up)" } else { "" }
            );
        }
        let state = inspector.inspect(path.as_path());
        Ok(Report { path, state })
    }

    /// Install, update or repair the add-on.
    pub fn install(&self, settings: &Settings) -> Result<Outcome> {
        let path = self.find(settings)?;
        self.install_at(path)
    }

    /// Remove the add-on and restore displaced originals.
    pub fn uninstall(&self, settings: &Settings) -> Result<Outcome> {
        let path = self.find(settings)?;
        self.uninstall_at(path)
    }

    /// Uninstall (a no-op when absent), then install.
    pub fn reinstall(&self, settings: &Settings) -> Result<Outcome> {
        let path = self.find(settings)?;
        self.uninstall_at(path.clone())?;
        match self.install_at(path)? {
            Outcome::Installed { path, version, .. } | Outcome::AlreadyInstalled { path, version } => {
                Ok(Outcome::Reinstalled { path, version })
            }
            other => Ok(other),
        }
    }

    fn install_at(&self, path: InstallationPath) -> Result<Outcome> {
        let inspector = self.inspector();
        let previous = inspector.inspect(path.as_path());
        info!("Current state in {path}: {previous}");
        if let InstallationState::Installed { version } = previous {
            return Ok(Outcome::AlreadyInstalled { path, version });
        }

        let started = Instant::now();
        let owned = inspector.owned_entries(path.as_path());
        let manifest = FileTransactor::new(path.as_path()).apply(&self.payload, &owned)?;
        info!("Applied in {}", humantime::format_duration(started.elapsed()));

        match inspector.inspect(path.as_path()) {
            InstallationState::Installed { version } if version == manifest.version => {
                Ok(Outcome::Installed {
                    path,
                    version,
                    previous,
                })
            }
            found => Err(Error::Verify {
                expected: "installed",
                found,
            }),
        }
    }

    fn uninstall_at(&self, path: InstallationPath) -> Result<Outcome> {
        let inspector = self.inspector();
        let previous = inspector.inspect(path.as_path());
        info!("Current state in {path}: {previous}");
        if previous == InstallationState::Absent {
            return Ok(Outcome::NotInstalled { path });
        }

        let started = Instant::now();
        let owned = inspector.owned_entries(path.as_path());
        FileTransactor::new(path.as_path()).revert(&owned)?;
        info!("Reverted in {}", humantime::format_duration(started.elapsed()));

        match inspector.inspect(path.as_path()) {
            InstallationState::Absent => Ok(Outcome::Uninstalled { path }),
            found => Err(Error::Verify {
                expected: "not installed",
                found,
            }),
        }
    }

    const fn inspector(&self) -> Inspector<'_> {
        Inspector::new(&self.payload)
    }
}
