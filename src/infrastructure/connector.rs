//! Turns kubeconfig bytes into a cluster connection.
//!
//! Nothing here talks to the cluster: bad credentials are rejected while
//! parsing, and unreachable servers surface on first use.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::{debug, info};

use super::binding::binding_kind;
use super::cluster::KubeCluster;
use super::helm::{HelmClient, ReleaseBackend};
use super::schema::SchemaRegistry;
use crate::config::CleanupConfig;
use crate::error::{ConnectError, ReleaseError};

/// Authenticated cluster client plus the raw credentials the release
/// manager needs separately
pub struct ClusterConnection {
    cluster: KubeCluster,
    credentials: Vec<u8>,
}

impl ClusterConnection {
    pub fn cluster(&self) -> &KubeCluster {
        &self.cluster
    }
}

impl ReleaseBackend for ClusterConnection {
    type Manager = HelmClient;

    fn release_manager(&self, namespace: &str) -> Result<HelmClient, ReleaseError> {
        HelmClient::from_kubeconfig(&self.credentials, namespace)
    }
}

/// Read the credentials file
pub fn load_credentials(path: &Path) -> Result<Vec<u8>, ConnectError> {
    std::fs::read(path).map_err(|source| ConnectError::CredentialsUnreadable {
        path: path.display().to_string(),
        source,
    })
}

/// Read the credentials at `path` and connect.
///
/// An unreadable file fails here, before any request reaches the cluster.
pub async fn open(path: &Path, config: &CleanupConfig) -> Result<ClusterConnection, ConnectError> {
    let credentials = load_credentials(path)?;
    debug!("Read {} bytes of credentials from {}", credentials.len(), path.display());
    connect(credentials, config).await
}

/// Parse credentials, build the client and register every tracked kind
pub async fn connect(
    credentials: Vec<u8>,
    config: &CleanupConfig,
) -> Result<ClusterConnection, ConnectError> {
    let client_config = client_config(&credentials).await?;
    debug!("Cluster endpoint: {}", client_config.cluster_url);

    let client = Client::try_from(client_config).map_err(ConnectError::Connection)?;

    let binding = binding_kind();
    let registry = SchemaRegistry::register(
        config
            .tracked_kinds()
            .into_iter()
            .chain(std::iter::once(&binding)),
    )?;
    info!("Registered {} resource types", registry.len());

    Ok(ClusterConnection {
        cluster: KubeCluster::new(client, registry),
        credentials,
    })
}

async fn client_config(credentials: &[u8]) -> Result<Config, ConnectError> {
    let yaml = std::str::from_utf8(credentials)?;
    let kubeconfig = Kubeconfig::from_yaml(yaml)?;
    Ok(Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?)
}
