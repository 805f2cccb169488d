use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::TransactError;

/// How to reverse one filesystem action.
#[derive(Debug)]
enum Undo {
    /// Move `from` back to `to`.
    Rename { from: PathBuf, to: PathBuf },
    /// Delete a file this transaction created.
    Remove(PathBuf),
    /// Delete a directory this transaction created, if it is still empty.
    RemoveDir(PathBuf),
}

/// In-memory undo log of one transaction. Only rolled back on request; a
/// dropped journal leaves the filesystem as it is, like a killed process.
#[derive(Debug, Default)]
pub(super) struct Journal {
    steps: Vec<Undo>,
}

impl Journal {
    /// Create every missing ancestor of `path` (inclusive).
    pub(super) fn create_dirs(&mut self, dir: &Path) -> Result<(), TransactError> {
        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|d| !d.exists())
            .map(Path::to_path_buf)
            .collect();
        for d in missing.into_iter().rev() {
            fs::create_dir(&d).map_err(|e| TransactError::io("create directory", &d, e))?;
            debug!("Created directory {}", d.display());
            self.steps.push(Undo::RemoveDir(d));
        }
        Ok(())
    }

    /// Rename `from` to `to`, creating `to`'s parent directories.
    pub(super) fn rename(&mut self, from: &Path, to: &Path) -> Result<(), TransactError> {
        if let Some(parent) = to.parent() {
            self.create_dirs(parent)?;
        }
        fs::rename(from, to).map_err(|e| TransactError::io("move", from, e))?;
        debug!("Moved {} -> {}", from.display(), to.display());
        self.steps.push(Undo::Rename {
            from: to.to_path_buf(),
            to: from.to_path_buf(),
        });
        Ok(())
    }

    /// Copy `from` to `to` through `scratch`. The copy is synced before it is
    /// renamed into place, so `to` never holds a partial file.
    pub(super) fn copy(&mut self, from: &Path, to: &Path, scratch: &Path) -> Result<(), TransactError> {
        if let Some(parent) = scratch.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TransactError::io("create directory", parent, e))?;
        }
        fs::copy(from, scratch).map_err(|e| TransactError::io("copy", from, e))?;
        fs::OpenOptions::new()
            .write(true)
            .open(scratch)
            .and_then(|f| f.sync_all())
            .map_err(|e| TransactError::io("sync", scratch, e))?;
        debug!("Copied {} -> {}", from.display(), scratch.display());
        self.rename(scratch, to)
    }

    /// Record a file created by a step the journal did not perform itself.
    pub(super) fn created(&mut self, path: &Path) {
        self.steps.push(Undo::Remove(path.to_path_buf()));
    }

    /// Undo every recorded step, newest first. Keeps going past failures and
    /// reports the first one.
    pub(super) fn rollback(&mut self) -> Result<(), TransactError> {
        let mut first_err = None;
        while let Some(step) = self.steps.pop() {
            let result = match &step {
                Undo::Rename { from, to } => {
                    debug!("Rollback: move {} -> {}", from.display(), to.display());
                    fs::rename(from, to).map_err(|e| TransactError::io("restore", to, e))
                }
                Undo::Remove(path) => {
                    debug!("Rollback: remove {}", path.display());
                    match fs::remove_file(path) {
                        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                            Err(TransactError::io("remove", path, e))
                        }
                        _ => Ok(()),
                    }
                }
                Undo::RemoveDir(path) => {
                    // Non-empty means something else lives there now; leave it.
                    let _ = fs::remove_dir(path);
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!("Rollback step failed: {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Roll back after `cause`, folding a rollback failure into the error.
    pub(super) fn abort(&mut self, cause: TransactError) -> TransactError {
        warn!("Rolling back: {cause}");
        match self.rollback() {
            Ok(()) => cause,
            Err(rollback) => TransactError::RollbackFailed {
                cause: Box::new(cause),
                rollback: Box::new(rollback),
            },
        }
    }
}
