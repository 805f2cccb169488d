use std::path::PathBuf;

use super::DiscoveryStrategy;

/// Scans a fixed list of conventional install locations.
#[derive(Debug, Clone)]
pub struct DefaultLocationScan {
    locations: Vec<PathBuf>,
}

impl DefaultLocationScan {
    /// Scan exactly these directories, each also probed with a `140` child.
    pub fn new(locations: Vec<PathBuf>) -> Self {
        Self { locations }
    }

    /// Conventional locations for this OS, then `extra_dirs`.
    pub fn platform(extra_dirs: &[PathBuf]) -> Self {
        let mut locations = platform_locations();
        locations.extend(extra_dirs.iter().cloned());
        Self::new(locations)
    }
}

impl DiscoveryStrategy for DefaultLocationScan {
    fn name(&self) -> &'static str {
        "default locations"
    }

    fn candidates(&self) -> Vec<PathBuf> {
        self.locations
            .iter()
            .flat_map(|dir| [dir.clone(), dir.join("140")])
            .collect()
    }
}

// ──────────────────────────── Linux ────────────────────────────

#[cfg(target_os = "linux")]
fn platform_locations() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(home) = dirs::home_dir() {
        out.push(home.join(".steam/steam/steamapps/common"));
        out.push(home.join(".local/share/Steam/steamapps/common"));
        out.push(home.join("GOG Games"));
        out.push(home.join("Games"));
    }
    out.push(PathBuf::from("/opt"));
    out
}

// ──────────────────────────── macOS ────────────────────────────

#[cfg(target_os = "macos")]
fn platform_locations() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(data) = dirs::data_dir() {
        out.push(data.join("Steam/steamapps/common"));
    }
    if let Some(home) = dirs::home_dir() {
        out.push(home.join("Games"));
    }
    out
}

// ──────────────────────────── Windows ────────────────────────────

#[cfg(target_os = "windows")]
fn platform_locations() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = ["ProgramFiles(x86)", "ProgramFiles"]
        .iter()
        .filter_map(std::env::var_os)
        .map(|p| PathBuf::from(p).join(r"Steam\steamapps\common"))
        .collect();
    out.push(PathBuf::from(r"C:\GOG Games"));
    out.push(PathBuf::from(r"C:\Program Files (x86)\GOG Galaxy\Games"));
    out
}

// ──────────────────────────── Fallback ────────────────────────────

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn platform_locations() -> Vec<PathBuf> {
    Vec::new()
}
