//! # Cleanup Configuration
//!
//! Everything the orchestrator needs to know about *what* to clean lives in
//! [`CleanupConfig`]: release names, the operating namespace for releases,
//! the tracked kinds for each phase and the settle policy between phases.
//!
//! Defaults target the Service Catalog / Helm Broker stack (see [`kinds`]).
//! A YAML file can override any subset of fields:
//!
//! ```yaml
//! releaseNamespace: kyma-system
//! releaseNames: [service-catalog]
//! uninstallTimeout: 2m
//! settle:
//!   deadline: 45s
//! deletableKinds:
//!   - group: servicecatalog.k8s.io
//!     version: v1beta1
//!     kind: ServiceInstance
//! ```

pub mod kinds;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::domain::TrackedKind;
use crate::error::ConfigError;

pub use kinds::{
    default_binding_usage_kinds, default_deletable_kinds, default_finalizer_kinds,
    default_release_names, DEFAULT_RELEASE_NAMESPACE,
};

/// Explicit cleanup configuration passed into the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfig {
    /// Namespace the package manager operates in
    #[serde(default = "default_release_namespace")]
    pub release_namespace: String,

    /// Releases uninstalled unconditionally, in order
    #[serde(default = "default_release_names")]
    pub release_names: Vec<String>,

    /// Per-release uninstall timeout
    #[serde(default = "default_uninstall_timeout", with = "humantime_serde")]
    pub uninstall_timeout: Duration,

    /// Kinds whose finalizers are cleared before deletion
    #[serde(default = "default_finalizer_kinds")]
    pub finalizer_kinds: Vec<TrackedKind>,

    /// Kinds whose owner references are cleared before deletion
    #[serde(default = "default_binding_usage_kinds")]
    pub binding_usage_kinds: Vec<TrackedKind>,

    /// Kinds bulk-deleted in every namespace
    #[serde(default = "default_deletable_kinds")]
    pub deletable_kinds: Vec<TrackedKind>,

    /// Readiness wait between phases
    #[serde(default)]
    pub settle: SettleConfig,
}

fn default_release_namespace() -> String {
    DEFAULT_RELEASE_NAMESPACE.to_string()
}

fn default_uninstall_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            release_namespace: default_release_namespace(),
            release_names: default_release_names(),
            uninstall_timeout: default_uninstall_timeout(),
            finalizer_kinds: default_finalizer_kinds(),
            binding_usage_kinds: default_binding_usage_kinds(),
            deletable_kinds: default_deletable_kinds(),
            settle: SettleConfig::default(),
        }
    }
}

impl CleanupConfig {
    /// Load from a YAML file, or fall back to the built-in defaults.
    ///
    /// Not validated here: flag overrides still apply, call [`Self::validate`]
    /// once they have.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Builder: set release namespace
    pub fn with_release_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.release_namespace = namespace.into();
        self
    }

    /// Builder: set uninstall timeout
    pub fn with_uninstall_timeout(mut self, timeout: Duration) -> Self {
        self.uninstall_timeout = timeout;
        self
    }

    /// Every kind any phase touches, without duplicates
    pub fn tracked_kinds(&self) -> Vec<&TrackedKind> {
        let mut seen = HashSet::new();
        self.finalizer_kinds
            .iter()
            .chain(&self.binding_usage_kinds)
            .chain(&self.deletable_kinds)
            .filter(|kind| seen.insert(*kind))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.release_namespace.is_empty() {
            errors.push("releaseNamespace is required".to_string());
        }
        if self.release_names.iter().any(|name| name.trim().is_empty()) {
            errors.push("releaseNames must not contain empty names".to_string());
        }
        if self.uninstall_timeout.is_zero() {
            errors.push("uninstallTimeout must be greater than zero".to_string());
        }
        for kind in self.tracked_kinds() {
            if kind.kind.is_empty() || kind.version.is_empty() {
                errors.push(format!("tracked kind {:?} needs both kind and version", kind));
            }
        }
        if let Err(e) = self.settle.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Backoff policy for the readiness wait between phases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleConfig {
    /// First pause between checks
    #[serde(default = "default_initial_interval", with = "humantime_serde")]
    pub initial_interval: Duration,

    /// Upper bound for a single pause
    #[serde(default = "default_max_interval", with = "humantime_serde")]
    pub max_interval: Duration,

    /// Multiplier applied to the pause after every unsuccessful check
    #[serde(default = "default_backoff_factor")]
    pub factor: u32,

    /// Overall bound for one wait
    #[serde(default = "default_deadline", with = "humantime_serde")]
    pub deadline: Duration,
}

fn default_initial_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_max_interval() -> Duration {
    Duration::from_secs(4)
}

fn default_backoff_factor() -> u32 {
    2
}

fn default_deadline() -> Duration {
    Duration::from_secs(30)
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            factor: default_backoff_factor(),
            deadline: default_deadline(),
        }
    }
}

impl SettleConfig {
    fn validate(&self) -> Result<(), String> {
        if self.factor == 0 {
            return Err("settle.factor must be at least 1".to_string());
        }
        if self.initial_interval > self.max_interval {
            return Err("settle.initialInterval must not exceed settle.maxInterval".to_string());
        }
        Ok(())
    }
}
