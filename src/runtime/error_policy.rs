//! # Error Policy
//!
//! Error handling and backoff for reconciliations that returned an error.

use crate::controller::reconciler::{backoff_key, ManagedRecord, Reconciler, ReconcilerError};
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info};

/// Requeue a failed record with its own Fibonacci backoff
pub fn handle_reconciliation_error<K, A, S>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler<A, S>>,
) -> Action
where
    K: ManagedRecord,
{
    let kind = K::KIND;
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.kind = %kind,
        resource.name = %name,
        resource.namespace = %namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    if let ReconcilerError::StatusUpdate { operation, outcome, .. } = error {
        error!(
            "Status update failed for {} {}/{} after remote {} ({}): {:?}",
            kind, namespace, name, operation, outcome, error
        );
    } else {
        error!("Reconciliation error for {} {}/{}: {:?}", kind, namespace, name, error);
    }
    observability::metrics::increment_reconciliation_errors(kind.as_str());

    let delay = ctx.next_error_backoff(&backoff_key(kind, &namespace, &name));
    info!("Retrying in {}s (trigger source: error-backoff)", delay.as_secs());

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
