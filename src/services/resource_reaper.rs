//! Bulk deletion of tracked kinds
//!
//! Expects finalizers to be stripped already: objects that still carry a
//! finalizer only get marked for deletion and stay behind.

use tracing::info;

use crate::domain::resource::scope_label;
use crate::domain::TrackedKind;
use crate::error::ClusterError;
use crate::infrastructure::ClusterApi;

pub struct ResourceReaper<'a, C> {
    cluster: &'a C,
    kinds: &'a [TrackedKind],
}

impl<'a, C: ClusterApi> ResourceReaper<'a, C> {
    pub fn new(cluster: &'a C, kinds: &'a [TrackedKind]) -> Self {
        Self { cluster, kinds }
    }

    /// Delete every object of every kind in every scope.
    ///
    /// Returns the number of bulk deletes issued. The first failure aborts.
    pub async fn reap(&self) -> Result<usize, ClusterError> {
        let namespaces = self.cluster.list_namespaces().await?;
        let mut issued = 0;

        for kind in self.kinds {
            for namespace in kind.scopes(&namespaces) {
                info!("{}s in {}", kind.kind, scope_label(namespace));
                self.cluster.delete_all(kind, namespace).await?;
                issued += 1;
            }
        }

        Ok(issued)
    }
}
