//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Kubernetes API (dynamic objects, bindings, secrets)
//! - Helm CLI (release lookup and uninstall)
//! - Kubeconfig loading

pub mod binding;
pub mod cluster;
pub mod connector;
pub mod helm;
pub mod schema;

#[cfg(test)]
pub mod fake;

// Re-export commonly used types
pub use cluster::ClusterApi;
pub use helm::{ReleaseBackend, ReleaseManager};
