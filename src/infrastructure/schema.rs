//! Resource type registration
//!
//! Tracked kinds are resolved into dynamic API descriptors once, at connect
//! time. Later phases look kinds up here instead of guessing again.

use kube::core::ApiResource;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::TrackedKind;
use crate::error::{ClusterError, ConnectError};

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    resources: HashMap<TrackedKind, ApiResource>,
}

impl SchemaRegistry {
    /// Register every kind, rejecting ones that cannot address a resource
    pub fn register<'a>(
        kinds: impl IntoIterator<Item = &'a TrackedKind>,
    ) -> Result<Self, ConnectError> {
        let mut resources = HashMap::new();

        for kind in kinds {
            validate(kind)?;
            let resource = kind.api_resource();
            debug!(
                "Registered {} as {}/{}",
                kind, resource.api_version, resource.plural
            );
            resources.insert(kind.clone(), resource);
        }

        Ok(Self { resources })
    }

    pub fn resolve(&self, kind: &TrackedKind) -> Result<&ApiResource, ClusterError> {
        self.resources
            .get(kind)
            .ok_or_else(|| ClusterError::UnknownKind {
                kind: kind.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

fn validate(kind: &TrackedKind) -> Result<(), ConnectError> {
    let reject = |reason: &str| ConnectError::Schema {
        kind: kind.to_string(),
        reason: reason.to_string(),
    };

    if kind.kind.is_empty() {
        return Err(reject("kind name is empty"));
    }
    if kind.version.is_empty() {
        return Err(reject("version is empty"));
    }
    if kind.kind.ends_with("List") {
        return Err(reject("list kinds are addressed through their item kind"));
    }
    if !kind.kind.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(reject("kind name must be alphanumeric"));
    }
    if matches!(&kind.plural, Some(plural) if plural.is_empty()) {
        return Err(reject("plural override is empty"));
    }
    Ok(())
}
