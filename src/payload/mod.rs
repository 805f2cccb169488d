//! The add-on as shipped with this installer: a set of files plus the
//! version they represent.
//!
//! On disk a payload is a directory holding `payload.toml` and a `files/`
//! tree mirroring the layout of the game directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::PayloadError;
use crate::hash::file_sha256;
use crate::version::VersionInfo;


/// Descriptor file inside a payload directory.
pub const DESCRIPTOR: &str = "payload.toml";
/// Subdirectory of a payload directory holding the add-on files.
pub const FILES_DIR: &str = "files";

/// One file the add-on places into the game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    /// Path inside the game directory, `/`-separated.
    pub relative: String,
    /// Where to copy the content from.
    pub source: PathBuf,
    /// SHA-256 of the content, lowercase hex.
    pub hash: String,
}

/// The bundled add-on.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Version this installer distributes.
    pub version: VersionInfo,
    /// Files sorted by relative path.
    pub files: Vec<PayloadFile>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    version: String,
}

impl Payload {
    /// Read `payload.toml` and hash every file under `files/`.
    pub fn load(dir: &Path) -> Result<Self, PayloadError> {
        let descriptor_path = dir.join(DESCRIPTOR);
        let raw = std::fs::read_to_string(&descriptor_path).map_err(|source| PayloadError::Io {
            path: descriptor_path.clone(),
            source,
        })?;
        let descriptor: Descriptor =
            toml::from_str(&raw).map_err(|source| PayloadError::Descriptor {
                path: descriptor_path,
                source,
            })?;

        let root = dir.join(FILES_DIR);
        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| PayloadError::Io {
                path: e.path().map_or_else(|| root.clone(), Path::to_path_buf),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let source = entry.path().to_path_buf();
            let relative = relative_name(&root, &source)?;
            let hash = file_sha256(&source).map_err(|e| PayloadError::Io {
                path: source.clone(),
                source: e,
            })?;
            files.push(PayloadFile {
                relative,
                source,
                hash,
            });
        }
        if files.is_empty() {
            return Err(PayloadError::Empty(dir.to_path_buf()));
        }
        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        tracing::debug!(
            "Loaded payload {} ({} files) from {}",
            descriptor.version,
            files.len(),
            dir.display()
        );
        Ok(Self {
            version: VersionInfo::new(descriptor.version),
            files,
        })
    }

    /// Default payload location: `payload/` next to the running executable.
    pub fn default_dir() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join("payload"))
    }

    /// Look up a payload file by its relative path.
    pub fn file(&self, relative: &str) -> Option<&PayloadFile> {
        self.files.iter().find(|f| f.relative == relative)
    }
}

fn relative_name(root: &Path, file: &Path) -> Result<String, PayloadError> {
    let rel = file
        .strip_prefix(root)
        .map_err(|_| PayloadError::BadName(file.to_path_buf()))?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    match parts {
        Some(parts) if !parts.is_empty() => Ok(parts.join("/")),
        _ => Err(PayloadError::BadName(file.to_path_buf())),
    }
}
