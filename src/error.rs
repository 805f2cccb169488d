//! Error types for locating the game, reading state and moving files.

use std::path::PathBuf;

use thiserror::Error;

use crate::inspect::InstallationState;

/// Why the target application could not be located.
#[derive(Debug, Error)]
pub enum LocateError {
    /// No discovery strategy produced a valid installation of 140.
    #[error("could not find where 140 is installed (pass --path <dir> to set it manually)")]
    NotFound,
    /// A user-supplied path failed validation.
    #[error("{} is not a 140 installation: {reason}", .path.display())]
    PathInvalid {
        /// The path as given.
        path: PathBuf,
        /// What the validation check found wrong.
        reason: String,
    },
}

/// The manifest file exists but cannot be used.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Reading or writing the file failed.
    #[error("failed to access manifest at {}: {source}", .path.display())]
    Io {
        /// Manifest file path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid manifest.
    #[error("manifest at {} is unreadable: {source}", .path.display())]
    Parse {
        /// Manifest file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// A filesystem failure during Apply or Revert.
#[derive(Debug, Error)]
pub enum TransactError {
    /// One filesystem action failed; every prior change was rolled back.
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        /// Short description of the action, e.g. "copy" or "remove".
        action: &'static str,
        /// Path the action targeted.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A staged file did not hash to the value the payload recorded.
    #[error("staged copy of {path} does not match the payload (expected {expected}, got {actual})")]
    HashMismatch {
        /// Relative path of the payload file.
        path: String,
        /// Hash recorded when the payload was loaded.
        expected: String,
        /// Hash of the staged copy.
        actual: String,
    },
    /// Writing the manifest or intent record failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The operation failed and undoing it failed as well.
    #[error("{cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// The failure that triggered the rollback.
        cause: Box<TransactError>,
        /// The failure hit while rolling back.
        rollback: Box<TransactError>,
    },
}

impl TransactError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// The bundled add-on could not be loaded.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The payload directory or one of its files could not be read.
    #[error("failed to read payload at {}: {source}", .path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// `payload.toml` is malformed.
    #[error("invalid payload descriptor {}: {source}", .path.display())]
    Descriptor {
        /// Descriptor path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The `files/` tree holds nothing to install.
    #[error("payload at {} contains no files", .0.display())]
    Empty(PathBuf),
    /// A payload file path cannot be expressed as a relative UTF-8 path.
    #[error("payload file {} has an unsupported name", .0.display())]
    BadName(PathBuf),
}

/// Any failure of an installation manager operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Path discovery failed.
    #[error(transparent)]
    Locate(#[from] LocateError),
    /// Apply or Revert failed.
    #[error(transparent)]
    Transact(#[from] TransactError),
    /// The operation ran but the directory did not end in the expected state.
    #[error("expected {expected} after the operation, found {found}")]
    Verify {
        /// What the operation should have produced.
        expected: &'static str,
        /// What the inspector reported.
        found: InstallationState,
    },
}

/// Result alias for manager operations.
pub type Result<T> = std::result::Result<T, Error>;
