//! # Lifecycle
//!
//! Finalizer protocol shared by every record kind.
//!
//! ```text
//! ActiveUnmarked --add marker--> ActiveMarked --deletion timestamp--> Deleting
//! Deleting --remote DELETE 2xx/404, remove marker--> (purged by the API server)
//! DeletingUnmarked: nothing left to clean up
//! ```
//!
//! The marker is released only after the remote object is confirmed gone, or
//! when the record never had a remote identifier.

use crate::client::{AdminApi, ApiMethod};
use crate::controller::reconciler::kind::{Identity, ManagedRecord};
use crate::controller::reconciler::status::rejected_status;
use crate::controller::reconciler::store::RecordStore;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::observability::metrics;
use kube::{Resource, ResourceExt};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    ActiveUnmarked,
    ActiveMarked,
    Deleting,
    DeletingUnmarked,
}

/// Classify a record by deletion timestamp and marker presence
pub fn phase<K: Resource>(record: &K, finalizer: &str) -> LifecyclePhase {
    let marked = has_finalizer(record, finalizer);
    match (record.meta().deletion_timestamp.is_some(), marked) {
        (false, false) => LifecyclePhase::ActiveUnmarked,
        (false, true) => LifecyclePhase::ActiveMarked,
        (true, true) => LifecyclePhase::Deleting,
        (true, false) => LifecyclePhase::DeletingUnmarked,
    }
}

pub fn has_finalizer<K: Resource>(record: &K, finalizer: &str) -> bool {
    record
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|list| list.iter().any(|f| f == finalizer))
}

/// Finalizer list with `finalizer` appended once
#[must_use]
pub fn with_finalizer(current: &[String], finalizer: &str) -> Vec<String> {
    let mut list = current.to_vec();
    if !list.iter().any(|f| f == finalizer) {
        list.push(finalizer.to_string());
    }
    list
}

/// Finalizer list with every copy of `finalizer` removed
#[must_use]
pub fn without_finalizer(current: &[String], finalizer: &str) -> Vec<String> {
    current
        .iter()
        .filter(|f| f.as_str() != finalizer)
        .cloned()
        .collect()
}

impl<A: AdminApi, S> Reconciler<A, S> {
    pub(crate) async fn add_finalizer<K>(&self, record: &K) -> Result<(), ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let finalizer = K::KIND.finalizer();
        debug!(kind = %K::KIND, name = %record.name_any(), %finalizer, "Adding finalizer");
        let list = with_finalizer(record.finalizers(), finalizer);
        self.store.set_finalizers(record, list).await?;
        Ok(())
    }

    /// Delete the remote object, then release the marker
    pub(crate) async fn finalize<K>(&self, record: &K) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let kind = K::KIND;
        let name = record.name_any();

        let remote_id = match kind.identity() {
            Identity::ByName => Some(name.clone()),
            Identity::ByAssignedId => record
                .sync_status()
                .and_then(|status| status.remote_id())
                .map(str::to_string),
        };

        let Some(remote_id) = remote_id else {
            info!(%kind, %name, "No remote object was ever created, releasing finalizer");
            self.release_finalizer(record).await?;
            metrics::increment_finalizations(kind.as_str(), "skipped");
            return Ok(ReconcileOutcome::Finalized);
        };

        let path = kind.object_path(&self.paths, &remote_id);
        let response = self.api.execute(ApiMethod::Delete, &path, None).await?;

        if response.is_success() || response.is_not_found() {
            let result = if response.is_not_found() {
                "already_absent"
            } else {
                "deleted"
            };
            info!(%kind, %name, %path, status = response.status, "Remote object removed");
            self.release_finalizer(record).await?;
            metrics::increment_finalizations(kind.as_str(), result);
            return Ok(ReconcileOutcome::Finalized);
        }

        warn!(
            %kind,
            %name,
            %path,
            status = response.status,
            "Remote delete rejected, keeping finalizer"
        );
        metrics::increment_finalizations(kind.as_str(), "rejected");

        let status = rejected_status(
            record.sync_status().and_then(|s| s.id.clone()),
            &response.body,
            record.meta().generation,
        );
        self.write_status(record, status, "delete").await?;

        Err(ReconcilerError::DeleteRejected {
            path,
            status: response.status,
            body: response.body,
        })
    }

    async fn release_finalizer<K>(&self, record: &K) -> Result<(), ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let list = without_finalizer(record.finalizers(), K::KIND.finalizer());
        self.store.set_finalizers(record, list).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{RoleMapping, RoleMappingSpec};

    const MARKER: &str = "rolemapping.security.search-operator.io/finalizer";

    fn mapping(finalizers: Vec<&str>, deleting: bool) -> RoleMapping {
        let mut record = RoleMapping::new("readers", RoleMappingSpec::default());
        record.metadata.finalizers = Some(finalizers.into_iter().map(String::from).collect());
        if deleting {
            record.metadata.deletion_timestamp =
                Some(serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap());
        }
        record
    }

    #[test]
    fn test_phase_classification() {
        assert_eq!(phase(&mapping(vec![], false), MARKER), LifecyclePhase::ActiveUnmarked);
        assert_eq!(phase(&mapping(vec![MARKER], false), MARKER), LifecyclePhase::ActiveMarked);
        assert_eq!(phase(&mapping(vec![MARKER], true), MARKER), LifecyclePhase::Deleting);
        assert_eq!(
            phase(&mapping(vec!["other/finalizer"], true), MARKER),
            LifecyclePhase::DeletingUnmarked
        );
    }

    #[test]
    fn test_with_finalizer_is_idempotent() {
        let once = with_finalizer(&["other".to_string()], MARKER);
        let twice = with_finalizer(&once, MARKER);
        assert_eq!(twice, vec!["other".to_string(), MARKER.to_string()]);
    }

    #[test]
    fn test_without_finalizer_keeps_foreign_markers() {
        let list = vec!["other".to_string(), MARKER.to_string()];
        assert_eq!(without_finalizer(&list, MARKER), vec!["other".to_string()]);
    }
}
