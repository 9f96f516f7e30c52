//! Built-in cleanup targets for the Service Catalog / Helm Broker stack.

use crate::domain::TrackedKind;

pub const DEFAULT_RELEASE_NAMESPACE: &str = "kyma-system";

pub const SERVICE_CATALOG_RELEASE: &str = "service-catalog";
pub const SERVICE_CATALOG_ADDONS_RELEASE: &str = "service-catalog-addons";
pub const HELM_BROKER_RELEASE: &str = "helm-broker";

const SERVICE_CATALOG_GROUP: &str = "servicecatalog.k8s.io";
const SERVICE_CATALOG_VERSION: &str = "v1beta1";
const KYMA_CATALOG_GROUP: &str = "servicecatalog.kyma-project.io";
const KYMA_CATALOG_VERSION: &str = "v1alpha1";

pub fn default_release_names() -> Vec<String> {
    vec![
        SERVICE_CATALOG_RELEASE.to_string(),
        SERVICE_CATALOG_ADDONS_RELEASE.to_string(),
        HELM_BROKER_RELEASE.to_string(),
    ]
}

/// Kinds whose finalizers are serviced by the removed controllers
pub fn default_finalizer_kinds() -> Vec<TrackedKind> {
    vec![
        service_catalog("ServiceBinding"),
        service_catalog("ServiceInstance"),
        service_catalog("ServiceBroker"),
        TrackedKind::cluster(
            SERVICE_CATALOG_GROUP,
            SERVICE_CATALOG_VERSION,
            "ClusterServiceBroker",
        ),
    ]
}

/// Kinds linked to bindings through owner references
pub fn default_binding_usage_kinds() -> Vec<TrackedKind> {
    vec![service_binding_usage()]
}

/// Kinds bulk-deleted at the end of the run, in deletion order
pub fn default_deletable_kinds() -> Vec<TrackedKind> {
    vec![
        service_binding_usage(),
        service_catalog("ServiceBinding"),
        service_catalog("ServiceInstance"),
        TrackedKind::namespaced(KYMA_CATALOG_GROUP, KYMA_CATALOG_VERSION, "ServiceBroker"),
        TrackedKind::cluster(KYMA_CATALOG_GROUP, KYMA_CATALOG_VERSION, "ClusterServiceBroker"),
    ]
}

fn service_catalog(kind: &str) -> TrackedKind {
    TrackedKind::namespaced(SERVICE_CATALOG_GROUP, SERVICE_CATALOG_VERSION, kind)
}

fn service_binding_usage() -> TrackedKind {
    TrackedKind::namespaced(KYMA_CATALOG_GROUP, KYMA_CATALOG_VERSION, "ServiceBindingUsage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_are_stripped_before_they_are_deleted() {
        let binding = service_catalog("ServiceBinding");
        assert!(default_finalizer_kinds().contains(&binding));
        assert!(default_deletable_kinds().contains(&binding));
    }

    #[test]
    fn test_usages_are_deleted_first() {
        assert_eq!(default_deletable_kinds()[0].kind, "ServiceBindingUsage");
    }

    #[test]
    fn test_cluster_brokers_are_cluster_scoped() {
        let finalizer_kinds = default_finalizer_kinds();
        let deletable_kinds = default_deletable_kinds();
        for kind in finalizer_kinds.iter().chain(&deletable_kinds) {
            assert_eq!(
                kind.kind.starts_with("Cluster"),
                !kind.is_namespaced(),
                "{}",
                kind
            );
        }
    }
}
