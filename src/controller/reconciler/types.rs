//! # Types
//!
//! Core types for the reconciler.

use crate::client::{ApiError, SearchApiClient};
use crate::config::ApiPaths;
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_ROLE_MAPPING_FOLLOW_UP_SECS,
};
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::reconciler::drift::DriftError;
use crate::controller::reconciler::kind::RecordKind;
use crate::controller::reconciler::store::{KubeStore, StoreError};
use crate::crd::SyncState;
use crate::translate::TranslateError;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to translate {kind} '{name}': {source}")]
    Translate {
        kind: RecordKind,
        name: String,
        #[source]
        source: TranslateError,
    },

    #[error("existence check GET {path} returned HTTP {status}: {body}")]
    ExistenceCheckFailed {
        path: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Drift(#[from] DriftError),

    #[error("remote DELETE {path} rejected with HTTP {status}: {body}")]
    DeleteRejected {
        path: String,
        status: u16,
        body: String,
    },

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// The remote side already reflects `outcome`; only the status write failed
    #[error("remote {operation} ended {outcome} but the status update failed: {source}")]
    StatusUpdate {
        operation: &'static str,
        outcome: SyncState,
        #[source]
        source: StoreError,
    },
}

/// What a reconcile invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record no longer exists
    Gone,
    /// Deletion requested on a record without the finalizer marker
    AwaitingDeletion,
    /// Remote object removed (or never existed) and marker released
    Finalized,
    /// Remote object created; `follow_up` asks for a prompt second pass
    Created { follow_up: bool },
    Updated,
    Unchanged,
    /// The remote API refused the write; recorded in status
    Rejected,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Gone => "gone",
            ReconcileOutcome::AwaitingDeletion => "awaiting-deletion",
            ReconcileOutcome::Finalized => "finalized",
            ReconcileOutcome::Created { .. } => "created",
            ReconcileOutcome::Updated => "updated",
            ReconcileOutcome::Unchanged => "unchanged",
            ReconcileOutcome::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared context of the four controllers
///
/// `A` is the remote admin API and `S` the record store. Production code
/// uses the defaults; tests plug in in-memory fakes.
pub struct Reconciler<A = SearchApiClient, S = KubeStore> {
    pub(crate) api: A,
    pub(crate) store: S,
    pub(crate) paths: ApiPaths,
    follow_up: Duration,
    backoff_min_secs: u64,
    backoff_max_secs: u64,
    // Keyed by "<kind>/<namespace>/<name>"
    backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl<A, S> std::fmt::Debug for Reconciler<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("paths", &self.paths)
            .field("follow_up", &self.follow_up)
            .field("backoff_min_secs", &self.backoff_min_secs)
            .field("backoff_max_secs", &self.backoff_max_secs)
            .finish_non_exhaustive()
    }
}

impl<A, S> Reconciler<A, S> {
    pub fn new(api: A, store: S, paths: ApiPaths) -> Self {
        Self {
            api,
            store,
            paths,
            follow_up: Duration::from_secs(DEFAULT_ROLE_MAPPING_FOLLOW_UP_SECS),
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Delay before the second pass that follows a fresh role create
    #[must_use]
    pub fn with_follow_up(mut self, follow_up: Duration) -> Self {
        self.follow_up = follow_up;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.backoff_min_secs = min_secs;
        self.backoff_max_secs = max_secs;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    /// Advance the error backoff of `key` and return the delay to wait
    pub fn next_error_backoff(&self, key: &str) -> Duration {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        states
            .entry(key.to_string())
            .or_insert_with(|| FibonacciBackoff::new(self.backoff_min_secs, self.backoff_max_secs))
            .next_backoff()
    }

    /// Forget the error backoff of `key` after a successful reconcile
    pub fn reset_backoff(&self, key: &str) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Requeue decision for a successful reconcile
    #[must_use]
    pub fn action_for(&self, outcome: ReconcileOutcome) -> Action {
        match outcome {
            ReconcileOutcome::Created { follow_up: true } => Action::requeue(self.follow_up),
            _ => Action::await_change(),
        }
    }
}

/// Backoff key of a record
#[must_use]
pub fn backoff_key(kind: RecordKind, namespace: &str, name: &str) -> String {
    format!("{kind}/{namespace}/{name}")
}
