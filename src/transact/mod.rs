//! Applies and reverts the add-on's files inside a game directory.
//!
//! Both directions run as one logical transaction:
//!
//! 1. everything new is staged inside a `work-<uuid>` directory first,
//! 2. each mutation of the game directory is recorded in an undo [`Journal`],
//! 3. the manifest write (Apply) or removal (Revert) is the commit point,
//! 4. a failure before the commit point rolls every recorded step back.
//!
//! A process killed before the commit point leaves `pending.json` (Apply) or
//! the old manifest (Revert) behind, so the next inspection reports the
//! directory as corrupted rather than installed.

mod journal;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::TransactError;
use crate::hash::file_sha256;
use crate::manifest::{self, join_relative, Manifest, ManifestEntry, StateDir};
use crate::payload::{Payload, PayloadFile};
use journal::Journal;

/// Performs file mutations for one game directory.
#[derive(Debug, Clone)]
pub struct FileTransactor {
    game_dir: PathBuf,
    state: StateDir,
}

/// What to do with one payload file.
#[derive(Debug)]
struct Placement {
    entry: ManifestEntry,
    /// Copy the current target into `backup/` before replacing it.
    back_up_target: bool,
    /// Move an unusable backup out of `backup/`.
    drop_backup: bool,
}

/// An Apply whose payload is staged but whose game-directory changes have
/// not started. Dropping it at any point before [`PreparedApply::commit`]
/// behaves like the process dying there.
#[derive(Debug)]
pub struct PreparedApply<'a> {
    tx: &'a FileTransactor,
    work: PathBuf,
    manifest: Manifest,
    placements: Vec<Placement>,
    retired: Vec<ManifestEntry>,
    journal: Journal,
}

impl FileTransactor {
    /// Transactor for the game installed at `game_dir`.
    pub fn new(game_dir: &Path) -> Self {
        Self {
            game_dir: game_dir.to_path_buf(),
            state: StateDir::new(game_dir),
        }
    }

    /// Install `payload`, treating `owned` as the files a previous install
    /// already claims. Returns the committed manifest.
    pub fn apply(&self, payload: &Payload, owned: &[ManifestEntry]) -> Result<Manifest, TransactError> {
        let mut prepared = self.prepare(payload, owned)?;
        prepared.swap_in()?;
        prepared.commit()
    }

    /// Stage `payload` into a fresh work directory and plan every change.
    pub fn prepare<'a>(
        &'a self,
        payload: &Payload,
        owned: &[ManifestEntry],
    ) -> Result<PreparedApply<'a>, TransactError> {
        self.sweep_work_dirs();
        let work = self.state.new_work_dir();
        fs::create_dir_all(&work).map_err(|e| TransactError::io("create directory", &work, e))?;

        info!("Staging {} files", payload.files.len());
        if let Err(e) = self.stage(payload, &work) {
            self.discard(&work);
            let _ = fs::remove_dir(self.state.root());
            return Err(e);
        }

        let owned: BTreeMap<&str, &ManifestEntry> =
            owned.iter().map(|e| (e.relative_path.as_str(), e)).collect();
        let placements: Vec<Placement> = payload
            .files
            .iter()
            .map(|file| self.plan(file, owned.get(file.relative.as_str()).copied()))
            .collect();
        let retired: Vec<ManifestEntry> = owned
            .values()
            .filter(|e| payload.file(&e.relative_path).is_none())
            .map(|e| (*e).clone())
            .collect();

        let manifest = Manifest::new(
            payload.version.clone(),
            placements.iter().map(|p| p.entry.clone()).collect(),
        );
        Ok(PreparedApply {
            tx: self,
            work,
            manifest,
            placements,
            retired,
            journal: Journal::default(),
        })
    }

    /// Remove the add-on files listed in `entries`, restore displaced
    /// originals, then drop the manifest. Entries whose file is already gone
    /// count as reverted.
    pub fn revert(&self, entries: &[ManifestEntry]) -> Result<(), TransactError> {
        self.sweep_work_dirs();
        let work = self.state.new_work_dir();
        fs::create_dir_all(&work).map_err(|e| TransactError::io("create directory", &work, e))?;
        let mut journal = Journal::default();

        info!("Reverting {} entries in {}", entries.len(), self.game_dir.display());
        let mut removed = Vec::new();
        if let Err(e) = self.revert_entries(entries, &work, &mut journal, &mut removed) {
            let err = journal.abort(e);
            self.discard(&work);
            return Err(err);
        }

        // Commit: drop the intent record, then the manifest.
        for record in [self.state.pending(), self.state.manifest()] {
            if !record.exists() {
                continue;
            }
            let parked = work.join(record.file_name().unwrap_or_default());
            if let Err(e) = journal.rename(&record, &parked) {
                let err = journal.abort(e);
                self.discard(&work);
                return Err(err);
            }
        }
        info!("Removed manifest");

        self.discard(&work);
        prune_empty_dirs(&self.state.backup_root());
        let _ = fs::remove_dir(self.state.root());
        for path in removed {
            prune_parents(&path, &self.game_dir);
        }
        Ok(())
    }

    fn revert_entries(
        &self,
        entries: &[ManifestEntry],
        work: &Path,
        journal: &mut Journal,
        removed: &mut Vec<PathBuf>,
    ) -> Result<(), TransactError> {
        let displaced = work.join("displaced");
        for entry in entries {
            let target = join_relative(&self.game_dir, &entry.relative_path);
            let backup = self.state.backup_of(&entry.relative_path);
            if entry.is_backup_of_original {
                if !self.state.backup_intact(entry) {
                    warn!("No usable backup of {}; leaving it in place", entry.relative_path);
                    if backup.exists() {
                        journal.rename(&backup, &join_relative(&work.join("stale-backup"), &entry.relative_path))?;
                    }
                    continue;
                }
                if target.exists() {
                    journal.rename(&target, &join_relative(&displaced, &entry.relative_path))?;
                }
                journal.rename(&backup, &target)?;
            } else if target.exists() {
                journal.rename(&target, &join_relative(&displaced, &entry.relative_path))?;
                removed.push(target);
            } else {
                debug!("{} already removed", entry.relative_path);
            }
        }
        Ok(())
    }

    fn stage(&self, payload: &Payload, work: &Path) -> Result<(), TransactError> {
        let stage = work.join("stage");
        for file in &payload.files {
            let dest = join_relative(&stage, &file.relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| TransactError::io("create directory", parent, e))?;
            }
            fs::copy(&file.source, &dest).map_err(|e| TransactError::io("copy", &file.source, e))?;
            let actual = file_sha256(&dest).map_err(|e| TransactError::io("hash", &dest, e))?;
            if actual != file.hash {
                return Err(TransactError::HashMismatch {
                    path: file.relative.clone(),
                    expected: file.hash.clone(),
                    actual,
                });
            }
            debug!("Staged {}", file.relative);
        }
        Ok(())
    }

    /// Decide how `file` replaces whatever is at its target.
    ///
    /// A target that matches neither the add-on content nor the payload is
    /// foreign (a game update, or an original whose backup never completed)
    /// and becomes the new original. Without a recorded original hash an
    /// existing backup wins, since the recorded content hash cannot be trusted.
    fn plan(&self, file: &PayloadFile, owned: Option<&ManifestEntry>) -> Placement {
        let target = join_relative(&self.game_dir, &file.relative);
        let current = file_sha256(&target).ok();
        let placement = |is_backup_of_original, back_up_target, drop_backup, original_hash| Placement {
            entry: ManifestEntry {
                relative_path: file.relative.clone(),
                content_hash: file.hash.clone(),
                is_backup_of_original,
                original_hash,
            },
            back_up_target,
            drop_backup,
        };

        match owned {
            Some(e) if e.is_backup_of_original => {
                let intact = self.state.backup_intact(e);
                let foreign = current
                    .as_deref()
                    .is_some_and(|h| h != e.content_hash && h != file.hash)
                    && (e.original_hash.is_some() || !intact);
                if foreign {
                    info!("{} changed since it was backed up; keeping the new copy as the original", file.relative);
                    placement(true, true, false, current)
                } else if intact {
                    placement(true, false, false, e.original_hash.clone())
                } else {
                    warn!("Backup of {} is missing or damaged; the original cannot be restored", file.relative);
                    let damaged = self.state.backup_of(&file.relative).exists();
                    placement(false, false, damaged, None)
                }
            }
            Some(_) => placement(false, false, false, None),
            None if target.is_file() => placement(true, true, false, current),
            None => placement(false, false, false, None),
        }
    }

    fn sweep_work_dirs(&self) {
        for dir in self.state.work_dirs() {
            debug!("Removing stale work directory {}", dir.display());
            self.discard(&dir);
        }
    }

    fn discard(&self, dir: &Path) {
        if let Err(e) = fs::remove_dir_all(dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {e}", dir.display());
            }
        }
    }
}

impl PreparedApply<'_> {
    /// The manifest that [`Self::commit`] will write.
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Write the intent record, back up originals and move staged files into
    /// the game directory. Rolls back and returns the error on failure.
    pub fn swap_in(&mut self) -> Result<(), TransactError> {
        if let Err(e) = self.try_swap_in() {
            let err = self.journal.abort(e);
            self.tx.discard(&self.work);
            let _ = fs::remove_dir(self.tx.state.root());
            return Err(err);
        }
        Ok(())
    }

    fn try_swap_in(&mut self) -> Result<(), TransactError> {
        let state = &self.tx.state;
        let displaced = self.work.join("displaced");
        let stage = self.work.join("stage");

        let pending = state.pending();
        if pending.exists() {
            self.journal.rename(&pending, &self.work.join("pending.prev.json"))?;
        }
        let mut intent_entries = self.manifest.entries.clone();
        intent_entries.extend(self.retired.iter().cloned());
        manifest::write_atomic(&pending, &Manifest::new(self.manifest.version.clone(), intent_entries))?;
        self.journal.created(&pending);

        info!("Backing up originals");
        let stale = self.work.join("stale-backup");
        for placement in self.placements.iter().filter(|p| p.back_up_target || p.drop_backup) {
            let rel = &placement.entry.relative_path;
            let backup = state.backup_of(rel);
            if backup.exists() {
                self.journal.rename(&backup, &join_relative(&stale, rel))?;
            }
            if placement.back_up_target {
                let target = join_relative(&self.tx.game_dir, rel);
                let scratch = join_relative(&self.work.join("backup-tmp"), rel);
                self.journal.copy(&target, &backup, &scratch)?;
            }
        }

        info!("Placing {} files", self.placements.len());
        for placement in &self.placements {
            let rel = &placement.entry.relative_path;
            let target = join_relative(&self.tx.game_dir, rel);
            if target.exists() {
                self.journal.rename(&target, &join_relative(&displaced, rel))?;
            }
            self.journal.rename(&join_relative(&stage, rel), &target)?;
        }

        for entry in &self.retired {
            info!("Retiring {}", entry.relative_path);
            let target = join_relative(&self.tx.game_dir, &entry.relative_path);
            let backup = state.backup_of(&entry.relative_path);
            if target.exists() {
                self.journal.rename(&target, &join_relative(&displaced, &entry.relative_path))?;
            }
            if entry.is_backup_of_original && state.backup_intact(entry) {
                self.journal.rename(&backup, &target)?;
            } else if backup.exists() {
                warn!("Backup of {} is damaged; discarding it", entry.relative_path);
                self.journal.rename(&backup, &join_relative(&stale, &entry.relative_path))?;
            }
        }
        Ok(())
    }

    /// Write the manifest (the commit point), then clear the intent record
    /// and the work directory.
    pub fn commit(mut self) -> Result<Manifest, TransactError> {
        let state = &self.tx.state;
        if let Err(e) = manifest::write_atomic(&state.manifest(), &self.manifest) {
            let err = self.journal.abort(e.into());
            self.tx.discard(&self.work);
            return Err(err);
        }
        info!("Committed manifest for version {}", self.manifest.version);

        if let Err(e) = fs::remove_file(state.pending()) {
            warn!("Failed to clear {}: {e}", state.pending().display());
        }
        self.tx.discard(&self.work);
        Ok(self.manifest)
    }
}

/// Remove empty directories under `root`, and `root` itself if it ends up empty.
fn prune_empty_dirs(root: &Path) {
    for entry in walkdir::WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
    {
        let _ = fs::remove_dir(entry.path());
    }
}

/// Remove now-empty parent directories of `path`, stopping at `stop`.
fn prune_parents(path: &Path, stop: &Path) {
    for dir in path.ancestors().skip(1) {
        if dir == stop || !dir.starts_with(stop) || fs::remove_dir(dir).is_err() {
            break;
        }
        debug!("Removed empty directory {}", dir.display());
    }
}
