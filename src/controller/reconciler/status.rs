//! # Status
//!
//! Building and persisting [`SyncStatus`] blocks.

use crate::client::ApiResponse;
use crate::controller::reconciler::kind::ManagedRecord;
use crate::controller::reconciler::store::RecordStore;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::{SyncState, SyncStatus};
use kube::{Resource, ResourceExt};
use tracing::{debug, error};

/// Status after a write attempt that reached the remote server
#[must_use]
pub fn status_from_response(
    response: &ApiResponse,
    id: Option<String>,
    generation: Option<i64>,
) -> SyncStatus {
    SyncStatus {
        id,
        state: Some(response.outcome),
        error: (response.outcome == SyncState::Error).then(|| response.body.clone()),
        observed_generation: generation,
        last_sync_time: None,
    }
}

#[must_use]
pub fn deployed_status(id: Option<String>, generation: Option<i64>) -> SyncStatus {
    SyncStatus {
        id,
        state: Some(SyncState::Deployed),
        error: None,
        observed_generation: generation,
        last_sync_time: None,
    }
}

#[must_use]
pub fn rejected_status(id: Option<String>, body: &str, generation: Option<i64>) -> SyncStatus {
    SyncStatus {
        id,
        state: Some(SyncState::Error),
        error: Some(body.to_string()),
        observed_generation: generation,
        last_sync_time: None,
    }
}

impl<A, S> Reconciler<A, S> {
    /// Persist `status` unless the record already carries the same outcome
    pub(crate) async fn write_status<K>(
        &self,
        record: &K,
        mut status: SyncStatus,
        operation: &'static str,
    ) -> Result<(), ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let name = record.name_any();
        if record
            .sync_status()
            .is_some_and(|current| current.same_outcome(&status))
        {
            debug!(kind = %K::KIND, %name, "Status unchanged, skipping update");
            return Ok(());
        }

        status.last_sync_time = Some(chrono::Utc::now().to_rfc3339());
        let outcome = status.state.unwrap_or(SyncState::Error);

        self.store
            .write_status(record, &status)
            .await
            .map_err(|source| {
                error!(
                    kind = %K::KIND,
                    %name,
                    generation = ?record.meta().generation,
                    %outcome,
                    "Status update failed after remote {operation}: {source}"
                );
                ReconcilerError::StatusUpdate {
                    operation,
                    outcome,
                    source,
                }
            })
    }
}
