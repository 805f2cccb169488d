//! Add-on version strings and their ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A version string as written in manifests and `payload.toml`.
///
/// Ordering is semantic when both sides parse as semver (missing minor/patch
/// components are padded with zeros, so "1.2" == "1.2.0"), and falls back to
/// plain string ordering otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionInfo(String);

impl VersionInfo {
    /// Wrap a raw version string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// The version exactly as recorded.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` is strictly older than `other`.
    pub fn is_older_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Less
    }

    fn semver(&self) -> Option<semver::Version> {
        let raw = self.0.strip_prefix('v').unwrap_or(&self.0);
        if let Ok(v) = semver::Version::parse(raw) {
            return Some(v);
        }
        let dots = raw.matches('.').count();
        let padded = match dots {
            0 => format!("{raw}.0.0"),
            1 => format!("{raw}.0"),
            _ => return None,
        };
        semver::Version::parse(&padded).ok()
    }
}

impl PartialEq for VersionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionInfo {}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.semver(), other.semver()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionInfo {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_ordering() {
        assert!(VersionInfo::from("1.0.0").is_older_than(&"1.2.0".into()));
        assert!(VersionInfo::from("1.9.0").is_older_than(&"1.10.0".into()));
        assert!(!VersionInfo::from("1.2.0").is_older_than(&"1.2.0".into()));
        assert!(!VersionInfo::from("2.0.0").is_older_than(&"1.2.0".into()));
    }

    #[test]
    fn test_short_forms_are_padded() {
        assert_eq!(VersionInfo::from("1.2"), VersionInfo::from("1.2.0"));
        assert_eq!(VersionInfo::from("v1"), VersionInfo::from("1.0.0"));
    }

    #[test]
    fn test_non_semver_falls_back_to_strings() {
        assert!(VersionInfo::from("alpha").is_older_than(&"beta".into()));
        assert_eq!(VersionInfo::from(" build-7 ").as_str(), "build-7");
    }
}
