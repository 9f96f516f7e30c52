//! Release domain types
//!
//! What the package manager reports about a release, and what removing it
//! amounted to.

use serde::Deserialize;
use std::fmt;

/// Release as reported by the package manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub revision: u32,
}

/// Subset of `helm status --output json`
#[derive(Debug, Deserialize)]
pub(crate) struct RawRelease {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub info: RawReleaseInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawReleaseInfo {
    #[serde(default)]
    pub status: Option<String>,
}

impl From<RawRelease> for ReleaseInfo {
    fn from(raw: RawRelease) -> Self {
        Self {
            name: raw.name,
            namespace: raw.namespace,
            status: raw.info.status.unwrap_or_else(|| "unknown".to_string()),
            revision: raw.version,
        }
    }
}

/// What happened to a single release during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Found and uninstalled
    Removed,
    /// Nothing installed under that name
    NotFound,
    /// Lookup or uninstall failed; the run carried on
    Failed(String),
}

impl ReleaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ReleaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => write!(f, "removed"),
            Self::NotFound => write!(f, "not found"),
            Self::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub name: String,
    pub outcome: ReleaseOutcome,
}
