//! Finding the directory 140 is installed in.
//!
//! Discovery is a chain of [`DiscoveryStrategy`] values tried in order. An
//! explicit path short-circuits the chain: if it fails validation the caller
//! gets [`LocateError::PathInvalid`] rather than a silent fallback.

mod defaults;
mod steam;
mod windows;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LocateError;
use crate::settings::Settings;

pub use defaults::DefaultLocationScan;
pub use steam::PackageManagerLookup;

/// Entries whose presence marks a directory as a 140 installation.
pub const SIGNATURES: &[&str] = &["140.exe", "140.x86_64", "140.x86", "140.app"];

/// Steam application id of 140.
pub const STEAM_APP_ID: u32 = 242_820;

/// A validated, absolute game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPath(PathBuf);

impl InstallationPath {
    /// Validate `dir` and wrap its canonical form.
    pub fn validate(dir: &Path) -> Result<Self, String> {
        if !dir.exists() {
            return Err("directory does not exist".into());
        }
        if !dir.is_dir() {
            return Err("not a directory".into());
        }
        if !SIGNATURES.iter().any(|s| dir.join(s).exists()) {
            return Err(format!("none of {} found", SIGNATURES.join(", ")));
        }
        let canonical = dir
            .canonicalize()
            .map_err(|e| format!("cannot resolve path: {e}"))?;
        Ok(Self(canonical))
    }

    /// The directory path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for InstallationPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for InstallationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// One way of proposing candidate game directories.
pub trait DiscoveryStrategy {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;
    /// Candidate directories, most likely first. Candidates need not exist.
    fn candidates(&self) -> Vec<PathBuf>;
}

/// A directory the user named explicitly.
#[derive(Debug, Clone)]
pub struct ExplicitPath(PathBuf);

impl ExplicitPath {
    /// Wrap a user-supplied path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Validate the path, with no fallback.
    pub fn resolve(&self) -> Result<InstallationPath, LocateError> {
        InstallationPath::validate(&self.0).map_err(|reason| LocateError::PathInvalid {
            path: self.0.clone(),
            reason,
        })
    }
}

impl DiscoveryStrategy for ExplicitPath {
    fn name(&self) -> &'static str {
        "explicit path"
    }

    fn candidates(&self) -> Vec<PathBuf> {
        vec![self.0.clone()]
    }
}

/// Ordered chain of discovery strategies.
pub struct PathResolver {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl PathResolver {
    /// Resolver over the given strategies, tried in order.
    pub fn new(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Steam lookup followed by the conventional locations for this OS plus
    /// `extra_dirs`.
    pub fn platform(extra_dirs: &[PathBuf]) -> Self {
        Self::new(vec![
            Box::new(PackageManagerLookup::platform()),
            Box::new(DefaultLocationScan::platform(extra_dirs)),
        ])
    }

    /// Resolve the game directory for these settings.
    pub fn resolve(&self, settings: &Settings) -> Result<InstallationPath, LocateError> {
        if let Some(path) = &settings.path {
            return ExplicitPath::new(path).resolve();
        }
        self.discover()
    }

    /// Run the strategy chain and return the first valid candidate.
    pub fn discover(&self) -> Result<InstallationPath, LocateError> {
        let mut seen: Vec<PathBuf> = Vec::new();
        for strategy in &self.strategies {
            for candidate in strategy.candidates() {
                if seen.contains(&candidate) {
                    continue;
                }
                match InstallationPath::validate(&candidate) {
                    Ok(found) => {
                        tracing::debug!("{}: found 140 at {found}", strategy.name());
                        return Ok(found);
                    }
                    Err(reason) => {
                        tracing::trace!("{}: {} rejected: {reason}", strategy.name(), candidate.display());
                    }
                }
                seen.push(candidate);
            }
        }
        Err(LocateError::NotFound)
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}
