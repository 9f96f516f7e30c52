//! Cluster control-plane access
//!
//! [`ClusterApi`] is the seam every cleanup phase talks through. The
//! production implementation, [`KubeCluster`], addresses tracked kinds as
//! dynamic objects and bindings/secrets through their typed APIs.

use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::{
    api::{Api, DeleteParams, DynamicObject, ListParams, ObjectMeta, Patch, PatchParams},
    Client, ResourceExt,
};
use serde_json::json;
use tracing::{debug, warn};

use super::binding::{binding_kind, ServiceBinding};
use super::schema::SchemaRegistry;
use crate::domain::resource::scope_label;
use crate::domain::{BindingRef, ObjectSummary, TrackedKind};
use crate::error::ClusterError;

/// Operations the cleanup phases need from the control plane
pub trait ClusterApi {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// List objects of `kind`; `None` lists cluster-wide
    async fn list_objects(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ClusterError>;

    async fn clear_finalizers(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError>;

    async fn clear_owner_references(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError>;

    /// Every binding in every namespace, in one query
    async fn list_bindings(&self) -> Result<Vec<BindingRef>, ClusterError>;

    async fn clear_binding_finalizers(&self, binding: &BindingRef) -> Result<(), ClusterError>;

    /// `Ok(None)` when the secret does not exist
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObjectSummary>, ClusterError>;

    async fn clear_secret_owner_references(
        &self,
        secret: &ObjectSummary,
    ) -> Result<(), ClusterError>;

    /// Delete every object of `kind`; `None` deletes cluster-wide
    async fn delete_all(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<(), ClusterError>;
}

/// kube-rs backed cluster access
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    registry: SchemaRegistry,
}

impl KubeCluster {
    pub fn new(client: Client, registry: SchemaRegistry) -> Self {
        Self { client, registry }
    }

    fn dynamic_api(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>, ClusterError> {
        let resource = self.registry.resolve(kind)?;
        Ok(match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        })
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

fn summarize(meta: &ObjectMeta) -> ObjectSummary {
    ObjectSummary {
        namespace: meta.namespace.clone(),
        name: meta.name.clone().unwrap_or_default(),
        finalizers: meta.finalizers.clone().unwrap_or_default(),
        owner_references: meta
            .owner_references
            .iter()
            .flatten()
            .map(|owner| format!("{}/{}", owner.kind, owner.name))
            .collect(),
    }
}

/// Overwrite the finalizer list of an object with an empty one
fn empty_finalizers() -> Patch<serde_json::Value> {
    Patch::Merge(json!({ "metadata": { "finalizers": [] } }))
}

fn empty_owner_references() -> Patch<serde_json::Value> {
    Patch::Merge(json!({ "metadata": { "ownerReferences": [] } }))
}

impl KubeCluster {
    async fn patch_dynamic(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
        patch: &Patch<serde_json::Value>,
    ) -> Result<(), ClusterError> {
        let api = self.dynamic_api(kind, object.namespace.as_deref())?;
        match api.patch(&object.name, &PatchParams::default(), patch).await {
            Ok(_) => Ok(()),
            // Gone between list and patch: nothing left to unblock
            Err(e) if is_not_found(&e) => {
                debug!("{} {} vanished before update", kind.kind, object.path());
                Ok(())
            }
            Err(source) => Err(ClusterError::Update {
                kind: kind.to_string(),
                object: object.path(),
                source,
            }),
        }
    }
}

impl ClusterApi for KubeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespaces = api
            .list(&ListParams::default())
            .await
            .map_err(ClusterError::ListNamespaces)?;

        Ok(namespaces.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_objects(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ClusterError> {
        let api = self.dynamic_api(kind, namespace)?;
        match api.list(&ListParams::default()).await {
            Ok(list) => Ok(list.items.iter().map(|obj| summarize(&obj.metadata)).collect()),
            Err(e) if is_not_found(&e) => {
                warn!("{} is not served by the cluster, skipping", kind);
                Ok(Vec::new())
            }
            Err(source) => Err(ClusterError::List {
                kind: kind.to_string(),
                scope: scope_label(namespace),
                source,
            }),
        }
    }

    async fn clear_finalizers(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        self.patch_dynamic(kind, object, &empty_finalizers()).await
    }

    async fn clear_owner_references(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        self.patch_dynamic(kind, object, &empty_owner_references())
            .await
    }

    async fn list_bindings(&self) -> Result<Vec<BindingRef>, ClusterError> {
        let api: Api<ServiceBinding> = Api::all(self.client.clone());
        match api.list(&ListParams::default()).await {
            Ok(list) => Ok(list.items.iter().map(BindingRef::from).collect()),
            Err(e) if is_not_found(&e) => {
                warn!("{} is not served by the cluster, skipping", binding_kind());
                Ok(Vec::new())
            }
            Err(source) => Err(ClusterError::List {
                kind: binding_kind().to_string(),
                scope: scope_label(None),
                source,
            }),
        }
    }

    async fn clear_binding_finalizers(&self, binding: &BindingRef) -> Result<(), ClusterError> {
        let api: Api<ServiceBinding> = Api::namespaced(self.client.clone(), &binding.namespace);
        match api
            .patch(&binding.name, &PatchParams::default(), &empty_finalizers())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!("ServiceBinding {} vanished before update", binding.path());
                Ok(())
            }
            Err(source) => Err(ClusterError::Update {
                kind: binding_kind().to_string(),
                object: binding.path(),
                source,
            }),
        }
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObjectSummary>, ClusterError> {
        let secret = self
            .secrets(namespace)
            .get_opt(name)
            .await
            .map_err(|source| ClusterError::Get {
                kind: "Secret".to_string(),
                object: format!("{}/{}", namespace, name),
                source,
            })?;

        Ok(secret.map(|s| summarize(&s.metadata)))
    }

    async fn clear_secret_owner_references(
        &self,
        secret: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        let namespace = secret.namespace.as_deref().unwrap_or_default();
        self.secrets(namespace)
            .patch(&secret.name, &PatchParams::default(), &empty_owner_references())
            .await
            .map(|_| ())
            .map_err(|source| ClusterError::Update {
                kind: "Secret".to_string(),
                object: secret.path(),
                source,
            })
    }

    async fn delete_all(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<(), ClusterError> {
        let api = self.dynamic_api(kind, namespace)?;
        match api
            .delete_collection(&DeleteParams::default(), &ListParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                warn!("{} is not served by the cluster, nothing to delete", kind);
                Ok(())
            }
            Err(source) => Err(ClusterError::Delete {
                kind: kind.to_string(),
                scope: scope_label(namespace),
                source,
            }),
        }
    }
}
