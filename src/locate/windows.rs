//! Registry lookups via `reg query`. Parsing is platform-independent; the
//! queries themselves only run on Windows.

#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use std::path::PathBuf;

use super::STEAM_APP_ID;

/// `InstallLocation` of the uninstall entry Steam creates for 140.
pub(super) fn uninstall_location() -> Option<PathBuf> {
    let app = format!(r"Microsoft\Windows\CurrentVersion\Uninstall\Steam App {STEAM_APP_ID}");
    [
        format!(r"HKLM\SOFTWARE\{app}"),
        format!(r"HKLM\SOFTWARE\WOW6432Node\{app}"),
    ]
    .iter()
    .find_map(|key| query_value(key, "InstallLocation"))
    .map(PathBuf::from)
}

/// Steam's own install directory.
pub(super) fn steam_install_path() -> Option<PathBuf> {
    [
        (r"HKCU\Software\Valve\Steam", "SteamPath"),
        (r"HKLM\SOFTWARE\WOW6432Node\Valve\Steam", "InstallPath"),
        (r"HKLM\SOFTWARE\Valve\Steam", "InstallPath"),
    ]
    .iter()
    .find_map(|(key, value)| query_value(key, value))
    .map(PathBuf::from)
}

#[cfg(target_os = "windows")]
fn query_value(key: &str, value: &str) -> Option<String> {
    let output = std::process::Command::new("reg")
        .args(["query", key, "/v", value])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_reg_value(&String::from_utf8_lossy(&output.stdout), value)
}

#[cfg(not(target_os = "windows"))]
fn query_value(_key: &str, _value: &str) -> Option<String> {
    None
}

/// Extract a string value from `reg query` output:
///
/// ```text
/// HKEY_LOCAL_MACHINE\SOFTWARE\...\Steam App 242820
///     InstallLocation    REG_SZ    C:\Games\Steam\steamapps\common\140
/// ```
pub(crate) fn parse_reg_value(output: &str, value: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix(value)?;
        let (_, data) = rest.split_once("REG_SZ").or_else(|| rest.split_once("REG_EXPAND_SZ"))?;
        let data = data.trim();
        (!data.is_empty()).then(|| data.to_string())
    })
}
