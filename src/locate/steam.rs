use std::path::{Path, PathBuf};

use super::{DiscoveryStrategy, STEAM_APP_ID};

/// Looks 140 up through Steam's library metadata (and, on Windows, the
/// uninstall entry Steam registers).
#[derive(Debug, Clone)]
pub struct PackageManagerLookup {
    steam_roots: Vec<PathBuf>,
    use_registry: bool,
}

impl PackageManagerLookup {
    /// Lookup over explicit Steam roots, without registry queries.
    pub fn new(steam_roots: Vec<PathBuf>) -> Self {
        Self {
            steam_roots,
            use_registry: false,
        }
    }

    /// Lookup over the usual Steam roots of this OS.
    pub fn platform() -> Self {
        let mut roots = platform_steam_roots();
        let use_registry = cfg!(target_os = "windows");
        if use_registry {
            if let Some(root) = super::windows::steam_install_path() {
                roots.insert(0, root);
            }
        }
        Self {
            steam_roots: roots,
            use_registry,
        }
    }
}

impl DiscoveryStrategy for PackageManagerLookup {
    fn name(&self) -> &'static str {
        "steam"
    }

    fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if self.use_registry {
            out.extend(super::windows::uninstall_location());
        }
        for root in &self.steam_roots {
            for library in libraries(root) {
                let install_dir = read_install_dir(&library).unwrap_or_else(|| "140".to_string());
                out.push(library.join("steamapps").join("common").join(install_dir));
            }
        }
        out
    }
}

/// The root itself plus every library listed in its `libraryfolders.vdf`.
fn libraries(root: &Path) -> Vec<PathBuf> {
    let mut libs = vec![root.to_path_buf()];
    for vdf in [
        root.join("steamapps").join("libraryfolders.vdf"),
        root.join("config").join("libraryfolders.vdf"),
    ] {
        let Ok(text) = std::fs::read_to_string(&vdf) else {
            continue;
        };
        for lib in parse_library_folders(&text) {
            if !libs.contains(&lib) {
                libs.push(lib);
            }
        }
    }
    libs
}

fn read_install_dir(library: &Path) -> Option<String> {
    let acf = library
        .join("steamapps")
        .join(format!("appmanifest_{STEAM_APP_ID}.acf"));
    let text = std::fs::read_to_string(acf).ok()?;
    parse_install_dir(&text)
}

/// Library paths from a `libraryfolders.vdf`, in file order.
///
/// Handles both the current layout (`"path"` keys inside numbered blocks) and
/// the legacy one (numbered keys mapping straight to a path).
pub(crate) fn parse_library_folders(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|line| {
            let tokens = quoted_tokens(line);
            let [key, value] = tokens.as_slice() else {
                return None;
            };
            let is_path_key = key.eq_ignore_ascii_case("path");
            let is_legacy = key.chars().all(|c| c.is_ascii_digit())
                && (value.contains('/') || value.contains('\\'));
            (is_path_key || is_legacy).then(|| PathBuf::from(value))
        })
        .collect()
}

/// The `installdir` value of an app manifest.
pub(crate) fn parse_install_dir(text: &str) -> Option<String> {
    text.lines().find_map(|line| match quoted_tokens(line).as_slice() {
        [key, value] if key.eq_ignore_ascii_case("installdir") && !value.is_empty() => {
            Some(value.clone())
        }
        _ => None,
    })
}

/// Double-quoted strings on one VDF line, with `\\` and `\"` unescaped.
fn quoted_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut token = String::new();
        while let Some(c) = chars.next() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some(next) = chars.next() {
                        token.push(next);
                    }
                }
                _ => token.push(c),
            }
        }
        tokens.push(token);
    }
    tokens
}

// ──────────────────────────── Steam roots ────────────────────────────

#[cfg(target_os = "linux")]
fn platform_steam_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".steam").join("steam"));
        roots.push(home.join(".steam").join("root"));
        roots.push(
            home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam"),
        );
    }
    if let Some(data) = dirs::data_local_dir() {
        roots.push(data.join("Steam"));
    }
    roots
}

#[cfg(target_os = "macos")]
fn platform_steam_roots() -> Vec<PathBuf> {
    dirs::data_dir()
        .map(|d| vec![d.join("Steam")])
        .unwrap_or_default()
}

#[cfg(target_os = "windows")]
fn platform_steam_roots() -> Vec<PathBuf> {
    ["ProgramFiles(x86)", "ProgramFiles"]
        .iter()
        .filter_map(std::env::var_os)
        .map(|p| PathBuf::from(p).join("Steam"))
        .collect()
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn platform_steam_roots() -> Vec<PathBuf> {
    Vec::new()
}
