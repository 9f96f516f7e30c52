//! Package-release manager access through the `helm` CLI
//!
//! A [`ReleaseBackend`] hands out [`ReleaseManager`]s scoped to one
//! namespace. The production backend writes the cluster credentials to a
//! private temp file and passes it to every `helm` invocation.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::domain::release::RawRelease;
use crate::domain::ReleaseInfo;
use crate::error::ReleaseError;

/// Extra time given to `helm` to report its own timeout before we give up on it
const UNINSTALL_GRACE: Duration = Duration::from_secs(30);

/// Release operations scoped to a single namespace
pub trait ReleaseManager {
    /// Fails with [`ReleaseError::NotFound`] when no release has that name
    async fn get_release(&self, name: &str) -> Result<ReleaseInfo, ReleaseError>;

    async fn uninstall_release(
        &self,
        name: &str,
        timeout: Duration,
        wait: bool,
    ) -> Result<(), ReleaseError>;
}

/// Constructs release managers for a namespace
pub trait ReleaseBackend {
    type Manager: ReleaseManager;

    fn release_manager(&self, namespace: &str) -> Result<Self::Manager, ReleaseError>;
}

/// `helm` CLI client bound to one namespace and one kubeconfig
pub struct HelmClient {
    binary: PathBuf,
    namespace: String,
    kubeconfig: NamedTempFile,
}

impl HelmClient {
    /// Resolve the helm binary (`HELM_BIN`, then `PATH`) and stage the kubeconfig
    pub fn from_kubeconfig(kubeconfig: &[u8], namespace: &str) -> Result<Self, ReleaseError> {
        let requested = std::env::var("HELM_BIN").unwrap_or_else(|_| "helm".to_string());
        Self::with_binary(&requested, kubeconfig, namespace)
    }

    /// Like [`Self::from_kubeconfig`] with an explicit binary name or path
    pub fn with_binary(
        requested: &str,
        kubeconfig: &[u8],
        namespace: &str,
    ) -> Result<Self, ReleaseError> {
        let unavailable = |message: String| ReleaseError::ClientUnavailable {
            binary: requested.to_string(),
            message,
        };

        let binary = which::which(requested).map_err(|e| unavailable(e.to_string()))?;

        let mut file = tempfile::Builder::new()
            .prefix("catalog-cleaner-")
            .suffix(".kubeconfig")
            .tempfile()
            .map_err(|e| unavailable(format!("cannot stage kubeconfig: {}", e)))?;
        file.write_all(kubeconfig)
            .and_then(|_| file.flush())
            .map_err(|e| unavailable(format!("cannot stage kubeconfig: {}", e)))?;

        debug!("Using {} for releases in {}", binary.display(), namespace);

        Ok(Self {
            binary,
            namespace: namespace.to_string(),
            kubeconfig: file,
        })
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .arg("--namespace")
            .arg(&self.namespace)
            .arg("--kubeconfig")
            .arg(self.kubeconfig.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl ReleaseManager for HelmClient {
    async fn get_release(&self, name: &str) -> Result<ReleaseInfo, ReleaseError> {
        let output = self
            .command(&status_args(name))
            .output()
            .await
            .map_err(|e| ReleaseError::Lookup {
                name: name.to_string(),
                message: format!("failed to run helm: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_status_failure(name, &stderr));
        }

        parse_release_info(name, &output.stdout)
    }

    async fn uninstall_release(
        &self,
        name: &str,
        timeout: Duration,
        wait: bool,
    ) -> Result<(), ReleaseError> {
        let timed_out = || ReleaseError::Timeout {
            name: name.to_string(),
            timeout_secs: timeout.as_secs(),
        };

        let run = self.command(&uninstall_args(name, timeout, wait)).output();
        let output = tokio::time::timeout(timeout + UNINSTALL_GRACE, run)
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| ReleaseError::Uninstall {
                name: name.to_string(),
                message: format!("failed to run helm: {}", e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_timeout(&stderr) {
            Err(timed_out())
        } else {
            Err(ReleaseError::Uninstall {
                name: name.to_string(),
                message: stderr.trim().to_string(),
            })
        }
    }
}

fn status_args(name: &str) -> Vec<String> {
    vec![
        "status".to_string(),
        name.to_string(),
        "--output".to_string(),
        "json".to_string(),
    ]
}

fn uninstall_args(name: &str, timeout: Duration, wait: bool) -> Vec<String> {
    // helm parses Go durations, so stick to whole seconds
    let mut args = vec![
        "uninstall".to_string(),
        name.to_string(),
        "--timeout".to_string(),
        format!("{}s", timeout.as_secs().max(1)),
    ];
    if wait {
        args.push("--wait".to_string());
    }
    args
}

fn classify_status_failure(name: &str, stderr: &str) -> ReleaseError {
    if stderr.contains("release: not found") {
        ReleaseError::NotFound {
            name: name.to_string(),
        }
    } else {
        ReleaseError::Lookup {
            name: name.to_string(),
            message: stderr.trim().to_string(),
        }
    }
}

fn is_timeout(stderr: &str) -> bool {
    stderr.contains("timed out waiting for the condition")
        || stderr.contains("context deadline exceeded")
}

fn parse_release_info(name: &str, stdout: &[u8]) -> Result<ReleaseInfo, ReleaseError> {
    serde_json::from_slice::<RawRelease>(stdout)
        .map(ReleaseInfo::from)
        .map_err(|e| ReleaseError::Lookup {
            name: name.to_string(),
            message: format!("unreadable helm status output: {}", e),
        })
}
