//! Finalizer stripping
//!
//! The controllers that would have serviced these finalizers were removed
//! with their releases, so anything still carrying one would hang in
//! deletion forever. This phase clears:
//!
//! 1. finalizers on every finalizer-bearing kind, in every namespace
//! 2. owner references on binding-usage kinds, in every namespace
//! 3. finalizers on every ServiceBinding, and owner references on the secret
//!    each binding points at
//!
//! Any failure aborts the phase. Objects that are already clean are skipped,
//! so re-running the phase writes nothing.

use tracing::{debug, info};

use crate::config::CleanupConfig;
use crate::domain::resource::scope_label;
use crate::domain::{StripSummary, TrackedKind};
use crate::error::ClusterError;
use crate::infrastructure::ClusterApi;

pub struct FinalizerStripper<'a, C> {
    cluster: &'a C,
    finalizer_kinds: &'a [TrackedKind],
    binding_usage_kinds: &'a [TrackedKind],
}

impl<'a, C: ClusterApi> FinalizerStripper<'a, C> {
    pub fn new(cluster: &'a C, config: &'a CleanupConfig) -> Self {
        Self {
            cluster,
            finalizer_kinds: &config.finalizer_kinds,
            binding_usage_kinds: &config.binding_usage_kinds,
        }
    }

    pub async fn strip(&self) -> Result<StripSummary, ClusterError> {
        let namespaces = self.cluster.list_namespaces().await?;
        let mut summary = StripSummary::default();

        for kind in self.finalizer_kinds {
            for namespace in kind.scopes(&namespaces) {
                summary.finalizers_removed += self.strip_kind(kind, namespace).await?;
            }
        }

        for kind in self.binding_usage_kinds {
            for namespace in kind.scopes(&namespaces) {
                summary.owner_references_cleared +=
                    self.clear_owner_references(kind, namespace).await?;
            }
        }

        summary.bindings_released = self.release_bindings().await?;

        info!(
            "Stripped {} finalizer set(s), {} owner reference set(s), {} binding(s)",
            summary.finalizers_removed,
            summary.owner_references_cleared,
            summary.bindings_released
        );
        Ok(summary)
    }

    /// Clear finalizers on every object of `kind` in one scope
    pub async fn strip_kind(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<usize, ClusterError> {
        let mut stripped = 0;

        for object in self.cluster.list_objects(kind, namespace).await? {
            if object.finalizers.is_empty() {
                continue;
            }
            self.cluster.clear_finalizers(kind, &object).await?;
            info!("{} {}: finalizers removed", kind.kind, object.path());
            stripped += 1;
        }

        Ok(stripped)
    }

    async fn clear_owner_references(
        &self,
        kind: &TrackedKind,
        namespace: Option<&str>,
    ) -> Result<usize, ClusterError> {
        let mut cleared = 0;

        for object in self.cluster.list_objects(kind, namespace).await? {
            if object.owner_references.is_empty() {
                continue;
            }
            info!(
                "Removing owner reference from {} {}",
                kind.kind,
                object.path()
            );
            self.cluster.clear_owner_references(kind, &object).await?;
            cleared += 1;
        }

        Ok(cleared)
    }

    /// Release every binding and detach its secret from it
    async fn release_bindings(&self) -> Result<usize, ClusterError> {
        info!("ServiceBindings secrets owner references");
        let bindings = self.cluster.list_bindings().await?;

        for binding in &bindings {
            info!("{}", binding.path());
            if !binding.finalizers.is_empty() {
                self.cluster.clear_binding_finalizers(binding).await?;
            }

            let secret = self
                .cluster
                .get_secret(&binding.namespace, &binding.secret_name)
                .await?
                .ok_or_else(|| ClusterError::MissingSecret {
                    binding: binding.path(),
                    secret: binding.secret_path(),
                })?;

            if !secret.owner_references.is_empty() {
                self.cluster.clear_secret_owner_references(&secret).await?;
            }
        }

        Ok(bindings.len())
    }
}

/// Count objects of `kinds` still carrying finalizers, across all scopes
pub async fn residual_finalizers<C: ClusterApi>(
    cluster: &C,
    kinds: &[TrackedKind],
) -> Result<usize, ClusterError> {
    let namespaces = cluster.list_namespaces().await?;
    let mut residual = 0;

    for kind in kinds {
        for namespace in kind.scopes(&namespaces) {
            let blocked = cluster
                .list_objects(kind, namespace)
                .await?
                .iter()
                .filter(|object| !object.finalizers.is_empty())
                .count();
            if blocked > 0 {
                debug!(
                    "{} {} still carry finalizers in {}",
                    blocked,
                    kind.kind,
                    scope_label(namespace)
                );
            }
            residual += blocked;
        }
    }

    Ok(residual)
}
