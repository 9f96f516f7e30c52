//! Centralized error types for catalog-cleaner
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Errors that stop the tool before any cleanup phase runs.
///
/// Phase errors are not converted into this type; they are recorded in the
/// run report so the remaining phases can still decide what to do.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while turning credentials into a cluster client
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("No credentials file given (set KUBECONFIG or pass --kubeconfig)")]
    MissingCredentials,

    #[error("Cannot read credentials from {path}: {source}")]
    CredentialsUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Credentials are not valid UTF-8: {0}")]
    CredentialsEncoding(#[from] std::str::Utf8Error),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(#[from] kube::config::KubeconfigError),

    #[error("Failed to construct cluster client: {0}")]
    Connection(#[source] kube::Error),

    #[error("Cannot register resource type {kind}: {reason}")]
    Schema { kind: String, reason: String },
}

impl ConnectError {
    /// Credential problems are detected before any cluster contact.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials
                | Self::CredentialsUnreadable { .. }
                | Self::CredentialsEncoding(_)
                | Self::InvalidCredentials(_)
        )
    }
}

/// Package-release manager errors
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Release {name} not found")]
    NotFound { name: String },

    #[error("Failed to look up release {name}: {message}")]
    Lookup { name: String, message: String },

    #[error("Failed to uninstall release {name}: {message}")]
    Uninstall { name: String, message: String },

    #[error("Uninstall of release {name} timed out after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },

    #[error("Release client unavailable ({binary}): {message}")]
    ClientUnavailable { binary: String, message: String },
}

/// Cluster API errors raised while stripping or reaping
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Failed to list namespaces: {0}")]
    ListNamespaces(#[source] kube::Error),

    #[error("Failed to list {kind} in {scope}: {source}")]
    List {
        kind: String,
        scope: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to update {kind} {object}: {source}")]
    Update {
        kind: String,
        object: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to get {kind} {object}: {source}")]
    Get {
        kind: String,
        object: String,
        #[source]
        source: kube::Error,
    },

    #[error("Failed to delete {kind} in {scope}: {source}")]
    Delete {
        kind: String,
        scope: String,
        #[source]
        source: kube::Error,
    },

    #[error("Secret {secret} linked from ServiceBinding {binding} does not exist")]
    MissingSecret { binding: String, secret: String },

    #[error("Resource type {kind} was not registered at connect time")]
    UnknownKind { kind: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Invalid configuration:\n  {}", .errors.join("\n  "))]
    Invalid { errors: Vec<String> },
}
