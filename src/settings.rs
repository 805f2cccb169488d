//! Caller-supplied options for a single operation.

use std::path::PathBuf;

/// Per-invocation user settings, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Explicit target directory; `None` means auto-discover.
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Settings that pin the target directory.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}
