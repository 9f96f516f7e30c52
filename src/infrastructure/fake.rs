//! In-memory cluster and release manager for tests.
//!
//! Every call is appended to a shared log so tests can assert on ordering.
//! Objects with finalizers survive a bulk delete (marked as terminating),
//! mirroring what a real API server does when no controller is left.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use kube::core::ErrorResponse;

use super::binding::binding_kind;
use super::cluster::ClusterApi;
use super::helm::{ReleaseBackend, ReleaseManager};
use crate::domain::{BindingRef, ObjectSummary, ReleaseInfo, TrackedKind};
use crate::error::{ClusterError, ReleaseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListNamespaces,
    List { kind: String, namespace: Option<String> },
    ClearFinalizers { kind: String, object: String },
    ClearOwnerReferences { kind: String, object: String },
    ListBindings,
    ClearBindingFinalizers { object: String },
    GetSecret { object: String },
    ClearSecretOwnerReferences { object: String },
    DeleteAll { kind: String, namespace: Option<String> },
    GetRelease { name: String },
    Uninstall { name: String },
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::ClearFinalizers { .. }
                | Self::ClearOwnerReferences { .. }
                | Self::ClearBindingFinalizers { .. }
                | Self::ClearSecretOwnerReferences { .. }
                | Self::DeleteAll { .. }
                | Self::Uninstall { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeObject {
    pub finalizers: Vec<String>,
    pub owner_references: Vec<String>,
    pub secret_name: Option<String>,
    pub terminating: bool,
}

type ObjectKey = (String, Option<String>, String);

#[derive(Default)]
struct State {
    namespaces: Vec<String>,
    objects: BTreeMap<ObjectKey, FakeObject>,
    secrets: BTreeMap<(String, String), FakeObject>,
    releases: BTreeMap<String, String>,
    calls: Vec<Call>,

    failing_lists: HashSet<String>,
    failing_deletes: HashSet<String>,
    namespace_lists_allowed: Option<usize>,
    failing_lookups: HashSet<String>,
    failing_uninstalls: HashSet<String>,
    hanging_uninstalls: HashSet<String>,
    lingering_releases: HashSet<String>,
    missing_client: bool,
}

/// Shared in-memory cluster; clones observe the same state
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

fn api_error(code: u16, message: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code,
    })
}

fn key(kind: &TrackedKind, namespace: Option<&str>, name: &str) -> ObjectKey {
    (kind.to_string(), namespace.map(str::to_string), name.to_string())
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_namespace(self, namespace: &str) -> Self {
        self.state().namespaces.push(namespace.to_string());
        self
    }

    pub fn with_object(
        self,
        kind: &TrackedKind,
        namespace: Option<&str>,
        name: &str,
        finalizers: &[&str],
    ) -> Self {
        let object = FakeObject {
            finalizers: finalizers.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        };
        self.insert(kind, namespace, name, object)
    }

    pub fn with_owned_object(
        self,
        kind: &TrackedKind,
        namespace: &str,
        name: &str,
        owners: &[&str],
    ) -> Self {
        let object = FakeObject {
            owner_references: owners.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        };
        self.insert(kind, Some(namespace), name, object)
    }

    pub fn with_binding(
        self,
        namespace: &str,
        name: &str,
        secret: &str,
        finalizers: &[&str],
    ) -> Self {
        let object = FakeObject {
            finalizers: finalizers.iter().map(|f| f.to_string()).collect(),
            secret_name: Some(secret.to_string()),
            ..Default::default()
        };
        self.insert(&binding_kind(), Some(namespace), name, object)
    }

    pub fn with_secret(self, namespace: &str, name: &str, owners: &[&str]) -> Self {
        let secret = FakeObject {
            owner_references: owners.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        };
        self.state()
            .secrets
            .insert((namespace.to_string(), name.to_string()), secret);
        self
    }

    pub fn with_release(self, name: &str) -> Self {
        self.state()
            .releases
            .insert(name.to_string(), "deployed".to_string());
        self
    }

    fn insert(
        self,
        kind: &TrackedKind,
        namespace: Option<&str>,
        name: &str,
        object: FakeObject,
    ) -> Self {
        self.state()
            .objects
            .insert(key(kind, namespace, name), object);
        self
    }

    /// Listing `kind` fails with a server error
    pub fn failing_list(self, kind: &TrackedKind) -> Self {
        self.state().failing_lists.insert(kind.to_string());
        self
    }

    /// Bulk-deleting `kind` fails with a server error
    pub fn failing_delete(self, kind: &TrackedKind) -> Self {
        self.state().failing_deletes.insert(kind.to_string());
        self
    }

    /// Namespace listing succeeds `allowed` times, then fails
    pub fn failing_namespace_list_after(self, allowed: usize) -> Self {
        self.state().namespace_lists_allowed = Some(allowed);
        self
    }

    pub fn failing_lookup(self, release: &str) -> Self {
        self.state().failing_lookups.insert(release.to_string());
        self
    }

    pub fn failing_uninstall(self, release: &str) -> Self {
        self.state().failing_uninstalls.insert(release.to_string());
        self
    }

    /// Uninstall never finishes within its timeout
    pub fn hanging_uninstall(self, release: &str) -> Self {
        self.state().hanging_uninstalls.insert(release.to_string());
        self
    }

    /// Release record stays visible after a successful uninstall
    pub fn lingering_release(self, release: &str) -> Self {
        self.state().lingering_releases.insert(release.to_string());
        self
    }

    pub fn without_release_client(self) -> Self {
        self.state().missing_client = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn object(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<FakeObject> {
        self.state()
            .objects
            .get(&key(kind, namespace, name))
            .cloned()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<FakeObject> {
        self.state()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn has_release(&self, name: &str) -> bool {
        self.state().releases.contains_key(name)
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }

    fn update_object(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
        update: impl FnOnce(&mut FakeObject),
    ) {
        let mut state = self.state();
        if let Some(stored) = state
            .objects
            .get_mut(&key(kind, object.namespace.as_deref(), &object.name))
        {
            update(stored);
        }
    }
}

fn summarize((_, namespace, name): &ObjectKey, object: &FakeObject) -> ObjectSummary {
    ObjectSummary {
        namespace: namespace.clone(),
        name: name.clone(),
        finalizers: object.finalizers.clone(),
        owner_references: object.owner_references.clone(),
    }
}

fn in_scope((_, ns, _): &ObjectKey, namespace: Option<&str>) -> bool {
    namespace.is_none() || ns.as_deref() == namespace
}

impl ClusterApi for FakeCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        self.record(Call::ListNamespaces);
        let mut state = self.state();
        if let Some(allowed) = state.namespace_lists_allowed.as_mut() {
            if *allowed == 0 {
                return Err(ClusterError::ListNamespaces(api_error(500, "etcd unavailable")));
            }
            *allowed -= 1;
        }
        Ok(state.namespaces.clone())
    }

    async fn list_objects(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<Vec<ObjectSummary>, ClusterError> {
        self.record(Call::List {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
        });
        let state = self.state();
        if state.failing_lists.contains(&kind.to_string()) {
            return Err(ClusterError::List {
                kind: kind.to_string(),
                scope: crate::domain::resource::scope_label(namespace),
                source: api_error(500, "internal error"),
            });
        }

        let label = kind.to_string();
        Ok(state
            .objects
            .iter()
            .filter(|(key, _)| key.0 == label && in_scope(key, namespace))
            .map(|(key, object)| summarize(key, object))
            .collect())
    }

    async fn clear_finalizers(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        self.record(Call::ClearFinalizers {
            kind: kind.to_string(),
            object: object.path(),
        });
        self.update_object(kind, object, |stored| stored.finalizers.clear());
        Ok(())
    }

    async fn clear_owner_references(
        &self,
        kind: &TrackedKind,
        object: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        self.record(Call::ClearOwnerReferences {
            kind: kind.to_string(),
            object: object.path(),
        });
        self.update_object(kind, object, |stored| stored.owner_references.clear());
        Ok(())
    }

    async fn list_bindings(&self) -> Result<Vec<BindingRef>, ClusterError> {
        self.record(Call::ListBindings);
        let label = binding_kind().to_string();
        Ok(self
            .state()
            .objects
            .iter()
            .filter(|((kind, _, _), _)| *kind == label)
            .map(|((_, ns, name), object)| BindingRef {
                namespace: ns.clone().unwrap_or_default(),
                name: name.clone(),
                secret_name: object.secret_name.clone().unwrap_or_else(|| name.clone()),
                finalizers: object.finalizers.clone(),
            })
            .collect())
    }

    async fn clear_binding_finalizers(&self, binding: &BindingRef) -> Result<(), ClusterError> {
        self.record(Call::ClearBindingFinalizers {
            object: binding.path(),
        });
        let summary = ObjectSummary {
            namespace: Some(binding.namespace.clone()),
            name: binding.name.clone(),
            finalizers: binding.finalizers.clone(),
            owner_references: Vec::new(),
        };
        self.update_object(&binding_kind(), &summary, |stored| stored.finalizers.clear());
        Ok(())
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObjectSummary>, ClusterError> {
        self.record(Call::GetSecret {
            object: format!("{}/{}", namespace, name),
        });
        Ok(self
            .secret(namespace, name)
            .map(|secret| ObjectSummary {
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
                finalizers: secret.finalizers,
                owner_references: secret.owner_references,
            }))
    }

    async fn clear_secret_owner_references(
        &self,
        secret: &ObjectSummary,
    ) -> Result<(), ClusterError> {
        self.record(Call::ClearSecretOwnerReferences {
            object: secret.path(),
        });
        let namespace = secret.namespace.clone().unwrap_or_default();
        if let Some(stored) = self
            .state()
            .secrets
            .get_mut(&(namespace, secret.name.clone()))
        {
            stored.owner_references.clear();
        }
        Ok(())
    }

    async fn delete_all(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<(), ClusterError> {
        self.record(Call::DeleteAll {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
        });
        let label = kind.to_string();
        let mut state = self.state();
        if state.failing_deletes.contains(&label) {
            return Err(ClusterError::Delete {
                kind: label,
                scope: crate::domain::resource::scope_label(namespace),
                source: api_error(500, "internal error"),
            });
        }
        state.objects.retain(|key, object| {
            if key.0 != label || !in_scope(key, namespace) {
                return true;
            }
            if object.finalizers.is_empty() {
                return false;
            }
            object.terminating = true;
            true
        });
        Ok(())
    }
}

/// Release manager handed out by [`FakeCluster`]
pub struct FakeReleaseManager {
    cluster: FakeCluster,
    namespace: String,
}

impl ReleaseBackend for FakeCluster {
    type Manager = FakeReleaseManager;

    fn release_manager(&self, namespace: &str) -> Result<FakeReleaseManager, ReleaseError> {
        if self.state().missing_client {
            return Err(ReleaseError::ClientUnavailable {
                binary: "helm".to_string(),
                message: "cannot find binary path".to_string(),
            });
        }
        Ok(FakeReleaseManager {
            cluster: self.clone(),
            namespace: namespace.to_string(),
        })
    }
}

impl ReleaseManager for FakeReleaseManager {
    async fn get_release(&self, name: &str) -> Result<ReleaseInfo, ReleaseError> {
        self.cluster.record(Call::GetRelease {
            name: name.to_string(),
        });
        let state = self.cluster.state();
        if state.failing_lookups.contains(name) {
            return Err(ReleaseError::Lookup {
                name: name.to_string(),
                message: "Kubernetes cluster unreachable".to_string(),
            });
        }
        match state.releases.get(name) {
            Some(status) => Ok(ReleaseInfo {
                name: name.to_string(),
                namespace: self.namespace.clone(),
                status: status.clone(),
                revision: 1,
            }),
            None => Err(ReleaseError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    async fn uninstall_release(
        &self,
        name: &str,
        timeout: Duration,
        _wait: bool,
    ) -> Result<(), ReleaseError> {
        self.cluster.record(Call::Uninstall {
            name: name.to_string(),
        });
        let mut state = self.cluster.state();
        if state.failing_uninstalls.contains(name) {
            return Err(ReleaseError::Uninstall {
                name: name.to_string(),
                message: "uninstall: failed to delete release".to_string(),
            });
        }
        if state.hanging_uninstalls.contains(name) {
            return Err(ReleaseError::Timeout {
                name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        if !state.lingering_releases.contains(name) {
            state.releases.remove(name);
        }
        Ok(())
    }
}
