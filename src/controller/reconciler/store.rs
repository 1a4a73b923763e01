//! # Record Store
//!
//! Access to the desired-state records and their status sub-resource.
//!
//! [`KubeStore`] talks to the Kubernetes API server. The reconciler only
//! depends on [`RecordStore`], so tests run it against an in-memory store.

use crate::constants::FIELD_MANAGER;
use crate::controller::reconciler::kind::ManagedRecord;
use crate::crd::SyncStatus;
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Namespace and name of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub namespace: String,
    pub name: String,
}

impl RecordRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_resource<K: ResourceExt>(record: &K) -> Self {
        Self {
            namespace: record.namespace().unwrap_or_default(),
            name: record.name_any(),
        }
    }
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait RecordStore<K: ManagedRecord>: Send + Sync {
    /// Fetch the current record; `None` once it has been purged
    async fn load(&self, record: &RecordRef) -> Result<Option<K>, StoreError>;

    /// Replace the record's finalizer list
    async fn set_finalizers(&self, record: &K, finalizers: Vec<String>) -> Result<(), StoreError>;

    /// Replace the record's status
    async fn write_status(&self, record: &K, status: &SyncStatus) -> Result<(), StoreError>;
}

/// Record store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: ManagedRecord>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn patch_params() -> PatchParams {
        PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        }
    }
}

/// Merge-patch body for the status sub-resource
///
/// Every field is written, `None` as `null`, so a merge patch clears values
/// left over from an earlier outcome.
#[must_use]
pub fn status_patch(status: &SyncStatus) -> Value {
    json!({
        "status": {
            "id": status.id,
            "state": status.state,
            "error": status.error,
            "observedGeneration": status.observed_generation,
            "lastSyncTime": status.last_sync_time,
        }
    })
}

fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

#[async_trait]
impl<K: ManagedRecord> RecordStore<K> for KubeStore {
    async fn load(&self, record: &RecordRef) -> Result<Option<K>, StoreError> {
        Ok(self.api::<K>(&record.namespace).get_opt(&record.name).await?)
    }

    async fn set_finalizers(&self, record: &K, finalizers: Vec<String>) -> Result<(), StoreError> {
        let namespace = record.namespace().unwrap_or_default();
        let name = record.name_any();
        // resourceVersion turns the merge patch into a compare-and-swap
        let patch = json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": record.resource_version(),
            }
        });

        match self
            .api::<K>(&namespace)
            .patch(&name, &Self::patch_params(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!(%namespace, %name, "Record disappeared before finalizer update");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_status(&self, record: &K, status: &SyncStatus) -> Result<(), StoreError> {
        let namespace = record.namespace().unwrap_or_default();
        let name = record.name_any();
        let patch = status_patch(status);

        match self
            .api::<K>(&namespace)
            .patch_status(&name, &Self::patch_params(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!(%namespace, %name, "Record deleted during reconciliation, skipping status update");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
