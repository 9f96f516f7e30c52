//! Typed access to Service Catalog bindings.

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::domain::{BindingRef, TrackedKind};

/// Spec of `servicebindings.servicecatalog.k8s.io`, reduced to the fields
/// cleanup reads. Unknown fields are ignored when decoding.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize)]
#[kube(
    group = "servicecatalog.k8s.io",
    version = "v1beta1",
    kind = "ServiceBinding",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBindingSpec {
    /// Secret holding the credentials; the API server defaults it to the
    /// binding name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

/// The typed binding kind as a tracked kind
pub fn binding_kind() -> TrackedKind {
    TrackedKind::namespaced("servicecatalog.k8s.io", "v1beta1", "ServiceBinding")
}

impl From<&ServiceBinding> for BindingRef {
    fn from(binding: &ServiceBinding) -> Self {
        let name = binding.name_any();
        let secret_name = binding
            .spec
            .secret_name
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| name.clone());

        Self {
            namespace: binding.namespace().unwrap_or_default(),
            secret_name,
            finalizers: binding.finalizers().to_vec(),
            name,
        }
    }
}
