//! Derives the installation state purely from what is on disk.

use std::fmt;
use std::path::Path;

use crate::hash::file_sha256;
use crate::manifest::{self, join_relative, Manifest, ManifestEntry, StateDir};
use crate::payload::{Payload, PayloadFile};
use crate::version::VersionInfo;


/// Why an installation is not self-consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// The manifest exists but cannot be parsed.
    ManifestUnreadable(String),
    /// A transaction started and never committed or rolled back.
    Interrupted,
    /// A file listed in the manifest is gone.
    Missing(String),
    /// A file listed in the manifest has different content.
    Modified(String),
    /// A displaced original is no longer in the backup area.
    BackupMissing(String),
    /// The backup of a displaced original no longer matches it.
    BackupDamaged(String),
    /// An add-on file is present but no manifest records it.
    Unrecorded(String),
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestUnreadable(why) => write!(f, "manifest unreadable ({why})"),
            Self::Interrupted => write!(f, "a previous operation was interrupted"),
            Self::Missing(path) => write!(f, "{path} is missing"),
            Self::Modified(path) => write!(f, "{path} was modified"),
            Self::BackupMissing(path) => write!(f, "backup of {path} is missing"),
            Self::BackupDamaged(path) => write!(f, "backup of {path} is damaged"),
            Self::Unrecorded(path) => write!(f, "{path} is present without a manifest"),
        }
    }
}

/// What the inspector found in a game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationState {
    /// No add-on artifacts.
    Absent,
    /// Consistent and at least as new as the bundled version.
    Installed {
        /// Version recorded in the manifest.
        version: VersionInfo,
    },
    /// Consistent but older than the bundled version.
    Outdated {
        /// Version recorded in the manifest.
        installed: VersionInfo,
        /// Version this installer carries.
        bundled: VersionInfo,
    },
    /// Partial or mismatched artifacts.
    Corrupted(Corruption),
}

impl InstallationState {
    /// Whether no repair or update is needed.
    pub fn is_current(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

impl fmt::Display for InstallationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "not installed"),
            Self::Installed { version } => write!(f, "installed (version {version})"),
            Self::Outdated { installed, bundled } => {
                write!(f, "outdated (version {installed} installed, {bundled} available)")
            }
            Self::Corrupted(why) => write!(f, "corrupted: {why}"),
        }
    }
}

/// Reads installation state for one bundled payload.
#[derive(Debug, Clone, Copy)]
pub struct Inspector<'a> {
    payload: &'a Payload,
}

impl<'a> Inspector<'a> {
    /// Inspector comparing against `payload`.
    pub const fn new(payload: &'a Payload) -> Self {
        Self { payload }
    }

    /// Compute the state of the add-on in `game_dir`. Never mutates anything.
    pub fn inspect(&self, game_dir: &Path) -> InstallationState {
        let state = StateDir::new(game_dir);
        let manifest = match manifest::read(&state.manifest()) {
            Ok(m) => m,
            Err(e) => {
                let reason = match &e {
                    crate::error::ManifestError::Parse { source, .. } => source.to_string(),
                    crate::error::ManifestError::Io { source, .. } => source.to_string(),
                };
                tracing::debug!("{e}");
                return InstallationState::Corrupted(Corruption::ManifestUnreadable(reason));
            }
        };
        let pending = state.pending().exists();

        let Some(manifest) = manifest else {
            if pending || !state.backed_up_paths().is_empty() {
                return InstallationState::Corrupted(Corruption::Interrupted);
            }
            return match self.installed_payload_files(game_dir).next() {
                Some(file) => InstallationState::Corrupted(Corruption::Unrecorded(file.relative.clone())),
                None => InstallationState::Absent,
            };
        };
        if pending {
            return InstallationState::Corrupted(Corruption::Interrupted);
        }

        if let Some(problem) = manifest
            .entries
            .iter()
            .find_map(|entry| check_entry(game_dir, &state, entry))
        {
            return InstallationState::Corrupted(problem);
        }

        if manifest.version.is_older_than(&self.payload.version) {
            InstallationState::Outdated {
                installed: manifest.version,
                bundled: self.payload.version.clone(),
            }
        } else {
            InstallationState::Installed {
                version: manifest.version,
            }
        }
    }

    /// Manifest entries, or an empty set when there is no readable manifest.
    pub fn read_manifest(&self, game_dir: &Path) -> Vec<ManifestEntry> {
        manifest::read(&StateDir::new(game_dir).manifest())
            .ok()
            .flatten()
            .map(|m| m.entries)
            .unwrap_or_default()
    }

    /// Every entry the add-on may own in `game_dir`: committed entries,
    /// entries of an unfinished transaction, and, when the manifest cannot be
    /// read, entries reconstructed from the backup area and payload hashes.
    pub fn owned_entries(&self, game_dir: &Path) -> Vec<ManifestEntry> {
        let state = StateDir::new(game_dir);
        let committed = manifest::read(&state.manifest());
        let pending = manifest::read(&state.pending())
            .ok()
            .flatten()
            .map(|m| m.entries)
            .unwrap_or_default();

        let backed_up = state.backed_up_paths();
        let recovered = match &committed {
            Ok(Some(_)) => self.backup_entries(&backed_up),
            _ => self.recover_entries(game_dir, &backed_up),
        };
        let committed = committed
            .ok()
            .flatten()
            .map(|m: Manifest| m.entries)
            .unwrap_or_default();

        manifest::merge_entries([&committed[..], &pending[..], &recovered[..]])
    }

    /// Every file in the backup area stands for a displaced original.
    fn backup_entries(&self, backed_up: &[String]) -> Vec<ManifestEntry> {
        backed_up
            .iter()
            .map(|rel| ManifestEntry {
                relative_path: rel.clone(),
                content_hash: self
                    .payload
                    .file(rel)
                    .map(|f| f.hash.clone())
                    .unwrap_or_default(),
                is_backup_of_original: true,
                original_hash: None,
            })
            .collect()
    }

    fn recover_entries(&self, game_dir: &Path, backed_up: &[String]) -> Vec<ManifestEntry> {
        let mut entries = self.backup_entries(backed_up);
        entries.extend(
            self.installed_payload_files(game_dir)
                .filter(|file| !backed_up.contains(&file.relative))
                .map(|file| ManifestEntry {
                    relative_path: file.relative.clone(),
                    content_hash: file.hash.clone(),
                    is_backup_of_original: false,
                    original_hash: None,
                }),
        );
        tracing::debug!("Recovered {} entries from {}", entries.len(), game_dir.display());
        entries
    }

    /// Payload files whose target in `game_dir` already has the payload content.
    fn installed_payload_files<'g>(&'g self, game_dir: &'g Path) -> impl Iterator<Item = &'a PayloadFile> + 'g {
        let payload = self.payload;
        payload.files.iter().filter(move |file| {
            file_sha256(&join_relative(game_dir, &file.relative)).is_ok_and(|h| h == file.hash)
        })
    }
}

fn check_entry(game_dir: &Path, state: &StateDir, entry: &ManifestEntry) -> Option<Corruption> {
    let target = join_relative(game_dir, &entry.relative_path);
    match file_sha256(&target) {
        Err(_) => return Some(Corruption::Missing(entry.relative_path.clone())),
        Ok(hash) if hash != entry.content_hash => {
            return Some(Corruption::Modified(entry.relative_path.clone()))
        }
        Ok(_) => {}
    }
    if entry.is_backup_of_original {
        if !state.backup_of(&entry.relative_path).is_file() {
            return Some(Corruption::BackupMissing(entry.relative_path.clone()));
        }
        if !state.backup_intact(entry) {
            return Some(Corruption::BackupDamaged(entry.relative_path.clone()));
        }
    }
    None
}
