//! Release removal
//!
//! Uninstalls named releases from the operating namespace. A release that is
//! not installed is reported as such and counts as success, so the same list
//! of releases can be removed unconditionally on every run.

use std::time::Duration;
use tracing::{debug, info};

use crate::error::ReleaseError;
use crate::infrastructure::{ReleaseBackend, ReleaseManager};

/// What removing a release amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Uninstalled,
    NotFound,
}

pub struct ReleaseRemover<'a, B> {
    backend: &'a B,
    namespace: &'a str,
    timeout: Duration,
}

impl<'a, B: ReleaseBackend> ReleaseRemover<'a, B> {
    pub fn new(backend: &'a B, namespace: &'a str, timeout: Duration) -> Self {
        Self {
            backend,
            namespace,
            timeout,
        }
    }

    /// Look up `name` and uninstall it, waiting for completion
    pub async fn remove(&self, name: &str) -> Result<Removal, ReleaseError> {
        let manager = self.backend.release_manager(self.namespace)?;

        info!("Looking for {} release...", name);
        let release = match manager.get_release(name).await {
            Ok(release) => release,
            Err(ReleaseError::NotFound { .. }) => {
                info!("{} release not found, nothing to do", name);
                return Ok(Removal::NotFound);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Found {} release in the namespace {}: status {}, revision {}",
            release.name, release.namespace, release.status, release.revision
        );
        info!("Uninstalling {}...", name);
        manager.uninstall_release(name, self.timeout, true).await?;

        info!("{} uninstalled", name);
        Ok(Removal::Uninstalled)
    }

    /// Whether the release record is gone.
    ///
    /// Anything but a definite "not found" counts as still present.
    pub async fn is_gone(&self, name: &str) -> bool {
        let manager = match self.backend.release_manager(self.namespace) {
            Ok(manager) => manager,
            Err(e) => {
                debug!("Cannot check {}: {}", name, e);
                return false;
            }
        };

        matches!(
            manager.get_release(name).await,
            Err(ReleaseError::NotFound { .. })
        )
    }
}
