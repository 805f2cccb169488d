//! On-disk record of what the add-on owns inside the game directory.
//!
//! All installer state lives in a hidden directory inside the game directory:
//!
//! ```text
//! <game>/.speedrun-timer/
//!   manifest.json   commit record
//!   pending.json    intent record of an in-flight apply
//!   backup/<rel>    originals displaced by the add-on
//!   work-<uuid>/    staging area of one transaction
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ManifestError;
use crate::hash::file_sha256;
use crate::version::VersionInfo;


/// Name of the state directory inside the game directory.
pub const STATE_DIR: &str = ".speedrun-timer";

/// One file the add-on owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Path inside the game directory, `/`-separated.
    pub relative_path: String,
    /// SHA-256 of the installed content, lowercase hex.
    pub content_hash: String,
    /// Whether installing this file displaced an original that sits in `backup/`.
    pub is_backup_of_original: bool,
    /// SHA-256 of the displaced original, when it was hashed at backup time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_hash: Option<String>,
}

/// Installed version plus the owned entries.
///
/// `version` is serialized first and must stay the most stable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Version of the add-on these entries belong to.
    pub version: VersionInfo,
    /// Owned files, sorted by path.
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Build a manifest, sorting the entries by path.
    pub fn new(version: VersionInfo, mut entries: Vec<ManifestEntry>) -> Self {
        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Self { version, entries }
    }
}

/// Paths of the installer state inside one game directory.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// State directory of the game installed at `game_dir`.
    pub fn new(game_dir: &Path) -> Self {
        Self {
            root: game_dir.join(STATE_DIR),
        }
    }

    /// The `.speedrun-timer` directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Commit record.
    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    /// Intent record.
    pub fn pending(&self) -> PathBuf {
        self.root.join("pending.json")
    }

    /// Root of the original-file backups.
    pub fn backup_root(&self) -> PathBuf {
        self.root.join("backup")
    }

    /// Backup location of one relative path.
    pub fn backup_of(&self, relative: &str) -> PathBuf {
        join_relative(&self.backup_root(), relative)
    }

    /// Whether the backup of `entry` can be restored: it exists and, when the
    /// original was hashed, still has that hash.
    pub fn backup_intact(&self, entry: &ManifestEntry) -> bool {
        let backup = self.backup_of(&entry.relative_path);
        match &entry.original_hash {
            Some(expected) => file_sha256(&backup).is_ok_and(|h| &h == expected),
            None => backup.is_file(),
        }
    }

    /// Fresh transaction work directory path (not created).
    pub fn new_work_dir(&self) -> PathBuf {
        self.root.join(format!("work-{}", uuid::Uuid::new_v4()))
    }

    /// Existing `work-*` directories left by earlier transactions.
    pub fn work_dirs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("work-"))
            .map(|e| e.path())
            .collect()
    }

    /// Relative paths of every file under `backup/`.
    pub fn backed_up_paths(&self) -> Vec<String> {
        let root = self.backup_root();
        walkdir::WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&root).ok()?;
                let parts: Option<Vec<&str>> =
                    rel.components().map(|c| c.as_os_str().to_str()).collect();
                Some(parts?.join("/"))
            })
            .collect()
    }
}

/// Join a `/`-separated relative path onto `base`.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|p| !p.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

/// Read a manifest file; `Ok(None)` when it does not exist.
pub fn read(path: &Path) -> Result<Option<Manifest>, ManifestError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a manifest file atomically: temp file in the same directory, then rename.
pub fn write_atomic(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    let io_err = |source: std::io::Error| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_vec_pretty(manifest).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(&json).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    std::fs::rename(&tmp, path).map_err(io_err)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Union of entry sets keyed by path; a backup flag on either side wins, and
/// the first recorded original hash is kept.
pub fn merge_entries<'a>(sets: impl IntoIterator<Item = &'a [ManifestEntry]>) -> Vec<ManifestEntry> {
    let mut merged: BTreeMap<String, ManifestEntry> = BTreeMap::new();
    for entry in sets.into_iter().flatten() {
        merged
            .entry(entry.relative_path.clone())
            .and_modify(|e| {
                e.is_backup_of_original |= entry.is_backup_of_original;
                if e.original_hash.is_none() {
                    e.original_hash.clone_from(&entry.original_hash);
                }
            })
            .or_insert_with(|| entry.clone());
    }
    merged.into_values().collect()
}
