//! Resource domain types
//!
//! A tracked kind names a custom resource type by (group, version, kind)
//! plus the scope it lives in. Object summaries carry just enough metadata
//! to decide whether an object still blocks deletion.

use kube::core::{ApiResource, GroupVersionKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a kind lives inside namespaces or at cluster level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindScope {
    #[default]
    Namespaced,
    Cluster,
}

/// A custom resource type this tool knows how to enumerate and clean
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedKind {
    pub group: String,
    pub version: String,
    pub kind: String,

    #[serde(default)]
    pub scope: KindScope,

    /// Overrides the plural guessed from the kind name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
}

impl TrackedKind {
    pub fn namespaced(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            scope: KindScope::Namespaced,
            plural: None,
        }
    }

    pub fn cluster(group: &str, version: &str, kind: &str) -> Self {
        Self {
            scope: KindScope::Cluster,
            ..Self::namespaced(group, version, kind)
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == KindScope::Namespaced
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
    }

    /// Dynamic API descriptor used to address this kind on the cluster
    pub fn api_resource(&self) -> ApiResource {
        match &self.plural {
            Some(plural) => ApiResource::from_gvk_with_plural(&self.gvk(), plural),
            None => ApiResource::from_gvk(&self.gvk()),
        }
    }

    /// Scopes this kind must be visited in.
    ///
    /// Namespaced kinds are visited once per namespace (`Some(ns)`),
    /// cluster-scoped kinds exactly once (`None`).
    pub fn scopes<'a>(&self, namespaces: &'a [String]) -> Vec<Option<&'a str>> {
        if self.is_namespaced() {
            namespaces.iter().map(|ns| Some(ns.as_str())).collect()
        } else {
            vec![None]
        }
    }
}

impl fmt::Display for TrackedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}/{}", self.kind, self.group, self.version)
        }
    }
}

/// Human-readable label for a list/delete scope
pub fn scope_label(namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => ns.to_string(),
        None => "cluster scope".to_string(),
    }
}

/// Metadata of a listed object relevant to cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub namespace: Option<String>,
    pub name: String,
    pub finalizers: Vec<String>,
    /// Owner references rendered as `Kind/name`
    pub owner_references: Vec<String>,
}

impl ObjectSummary {
    pub fn path(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// A ServiceBinding and the secret it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRef {
    pub namespace: String,
    pub name: String,
    pub secret_name: String,
    pub finalizers: Vec<String>,
}

impl BindingRef {
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn secret_path(&self) -> String {
        format!("{}/{}", self.namespace, self.secret_name)
    }
}
