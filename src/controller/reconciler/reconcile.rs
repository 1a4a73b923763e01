//! # Reconciliation Logic
//!
//! One generic reconcile loop for every [`ManagedRecord`] kind.
//!
//! ## Flow
//!
//! 1. Load the record; a purged record needs nothing
//! 2. Branch on the finalizer lifecycle (delete, or make sure the marker is set)
//! 3. Translate the spec into the wire payload
//! 4. Decide and issue the remote write according to the kind's [`WriteStrategy`]
//! 5. Write the outcome back into the record status
//!
//! Remote rejections of create/update writes end up in status as `Error` and
//! are not returned as errors. Everything else that goes wrong is returned to
//! the caller, which retries with backoff.

use crate::client::{AdminApi, ApiMethod, ApiResponse};
use crate::controller::reconciler::drift::{self, Existence};
use crate::controller::reconciler::kind::{ManagedRecord, RecordKind, WriteStrategy};
use crate::controller::reconciler::lifecycle::{self, LifecyclePhase};
use crate::controller::reconciler::status::{deployed_status, rejected_status, status_from_response};
use crate::controller::reconciler::store::{RecordRef, RecordStore};
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::observability::metrics;
use crate::translate::{self, RoleMappingPayload};
use kube::{Resource, ResourceExt};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

impl<A: AdminApi, S> Reconciler<A, S> {
    /// Converge the remote object of one record with its desired state
    pub async fn reconcile<K>(&self, record: &RecordRef) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let kind = K::KIND;
        let span = info_span!(
            "reconcile",
            kind = %kind,
            namespace = %record.namespace,
            name = %record.name,
        );

        async move {
            let start = Instant::now();
            metrics::increment_reconciliations(kind.as_str());

            let result = self.reconcile_inner::<K>(record).await;

            metrics::observe_reconciliation_duration(kind.as_str(), start.elapsed().as_secs_f64());
            if let Ok(outcome) = &result {
                debug!(%outcome, "Reconciliation finished");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn reconcile_inner<K>(&self, record: &RecordRef) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let Some(current) = self.store.load(record).await? else {
            debug!("Record not found, already reconciled");
            return Ok(ReconcileOutcome::Gone);
        };

        match lifecycle::phase(&current, K::KIND.finalizer()) {
            LifecyclePhase::DeletingUnmarked => {
                debug!("Record is being deleted and carries no finalizer");
                Ok(ReconcileOutcome::AwaitingDeletion)
            }
            LifecyclePhase::Deleting => self.finalize(&current).await,
            LifecyclePhase::ActiveUnmarked => {
                self.add_finalizer(&current).await?;
                self.sync(&current).await
            }
            LifecyclePhase::ActiveMarked => self.sync(&current).await,
        }
    }

    async fn sync<K>(&self, record: &K) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let payload = record
            .translate()
            .map_err(|source| ReconcilerError::Translate {
                kind: K::KIND,
                name: record.name_any(),
                source,
            })?;

        match K::KIND.write_strategy() {
            WriteStrategy::CreateThenUpdate => self.sync_by_assigned_id(record, &payload).await,
            WriteStrategy::DriftChecked => self.sync_drift_checked(record, &payload).await,
            WriteStrategy::Unconditional => self.sync_unconditional(record, &payload).await,
        }
    }

    /// `POST` without a stored id, `PUT {id}` once per new generation
    async fn sync_by_assigned_id<K>(
        &self,
        record: &K,
        payload: &K::Payload,
    ) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let kind = K::KIND;
        let generation = record.meta().generation;
        let status = record.sync_status();
        let stored_id = status.and_then(|s| s.remote_id()).map(str::to_string);

        let Some(id) = stored_id else {
            let path = kind.base_path(&self.paths).to_string();
            let response = self
                .write(kind, &record.name_any(), ApiMethod::Post, &path, payload, "create")
                .await?;
            let id = Some(response.remote_id.clone()).filter(|id| !id.is_empty());
            if response.is_success() && id.is_none() {
                warn!(%path, "Create succeeded but the response carried no _id");
            }

            self.write_status(record, status_from_response(&response, id, generation), "create")
                .await?;
            return Ok(if response.is_success() {
                ReconcileOutcome::Created { follow_up: false }
            } else {
                ReconcileOutcome::Rejected
            });
        };

        let edited = generation.is_some_and(|g| g > 1);
        let already_applied = status.and_then(|s| s.observed_generation) == generation;
        if !edited || already_applied {
            debug!(%id, ?generation, "Remote object already reflects this generation");
            return Ok(ReconcileOutcome::Unchanged);
        }

        let path = kind.object_path(&self.paths, &id);
        let response = self
            .write(kind, &record.name_any(), ApiMethod::Put, &path, payload, "update")
            .await?;
        let id = Some(response.remote_id.clone())
            .filter(|new_id| !new_id.is_empty())
            .or(Some(id));

        self.write_status(record, status_from_response(&response, id, generation), "update")
            .await?;
        Ok(if response.is_success() {
            ReconcileOutcome::Updated
        } else {
            ReconcileOutcome::Rejected
        })
    }

    /// `GET`, then `PUT` when the remote object is absent or has drifted
    async fn sync_drift_checked<K>(
        &self,
        record: &K,
        payload: &K::Payload,
    ) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let kind = K::KIND;
        let name = record.name_any();
        let generation = record.meta().generation;
        let path = kind.object_path(&self.paths, &name);

        let remote = match drift::exists(&self.api, &path).await? {
            Existence::Absent => {
                info!(%path, "Remote object absent, creating");
                let response = self
                    .write(kind, &name, ApiMethod::Put, &path, payload, "create")
                    .await?;
                self.write_status(record, status_from_response(&response, None, generation), "create")
                    .await?;
                // The dependent mapping is synchronized by the follow-up pass
                return Ok(if response.is_success() {
                    ReconcileOutcome::Created {
                        follow_up: record.dependent_role_mapping().is_some(),
                    }
                } else {
                    ReconcileOutcome::Rejected
                });
            }
            Existence::Present(body) => body,
        };

        let (mut status, mut outcome) = if record.needs_write(&remote, payload)? {
            metrics::increment_drift_detected(kind.as_str());
            info!(%path, "Remote object drifted, updating");
            let response = self
                .write(kind, &name, ApiMethod::Put, &path, payload, "update")
                .await?;
            let outcome = if response.is_success() {
                ReconcileOutcome::Updated
            } else {
                ReconcileOutcome::Rejected
            };
            (status_from_response(&response, None, generation), outcome)
        } else {
            debug!(%path, "Remote object up to date");
            (deployed_status(None, generation), ReconcileOutcome::Unchanged)
        };

        if let Some(mapping) = record.dependent_role_mapping() {
            let mapping_response = self.sync_role_mapping(&name, &mapping).await?;
            if let Some(response) = mapping_response.filter(|r| !r.is_success()) {
                if outcome != ReconcileOutcome::Rejected {
                    warn!(%name, status = response.status, "Role mapping write rejected");
                    status = rejected_status(None, &response.body, generation);
                    outcome = ReconcileOutcome::Rejected;
                }
            }
        }

        self.write_status(record, status, "update").await?;
        Ok(outcome)
    }

    /// `PUT` on every pass
    async fn sync_unconditional<K>(
        &self,
        record: &K,
        payload: &K::Payload,
    ) -> Result<ReconcileOutcome, ReconcilerError>
    where
        K: ManagedRecord,
        S: RecordStore<K>,
    {
        let kind = K::KIND;
        let name = record.name_any();
        let path = kind.object_path(&self.paths, &name);
        let response = self
            .write(kind, &name, ApiMethod::Put, &path, payload, "upsert")
            .await?;

        self.write_status(
            record,
            status_from_response(&response, None, record.meta().generation),
            "upsert",
        )
        .await?;

        Ok(match response.status {
            201 => ReconcileOutcome::Created { follow_up: false },
            _ if response.is_success() => ReconcileOutcome::Updated,
            _ => ReconcileOutcome::Rejected,
        })
    }

    /// Bring the mapping named after a role in line with `desired`
    ///
    /// Returns the write response, or `None` when no write was needed.
    pub(crate) async fn sync_role_mapping(
        &self,
        name: &str,
        desired: &RoleMappingPayload,
    ) -> Result<Option<ApiResponse>, ReconcilerError> {
        let kind = RecordKind::RoleMapping;
        let path = kind.object_path(&self.paths, name);

        let operation = match drift::exists(&self.api, &path).await? {
            Existence::Absent => "create",
            Existence::Present(body) => {
                if !drift::needs_write(&body, name, desired)? {
                    debug!(%path, "Role mapping up to date");
                    return Ok(None);
                }
                metrics::increment_drift_detected(kind.as_str());
                "update"
            }
        };

        info!(%path, %operation, "Synchronizing role mapping");
        let response = self
            .write(kind, name, ApiMethod::Put, &path, desired, operation)
            .await?;
        Ok(Some(response))
    }

    /// Encode `payload` and send it; `name` identifies the record in errors
    async fn write<P: serde::Serialize>(
        &self,
        kind: RecordKind,
        name: &str,
        method: ApiMethod,
        path: &str,
        payload: &P,
        operation: &'static str,
    ) -> Result<ApiResponse, ReconcilerError> {
        let body = translate::encode(payload).map_err(|source| ReconcilerError::Translate {
            kind,
            name: name.to_string(),
            source,
        })?;
        metrics::increment_remote_writes(kind.as_str(), operation);

        let response = self.api.execute(method, path, Some(body)).await?;
        if !response.is_success() {
            warn!(
                %kind,
                %method,
                %path,
                status = response.status,
                "Remote API rejected {operation}"
            );
        }
        Ok(response)
    }
}
