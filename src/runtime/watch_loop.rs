//! # Watch Loop
//!
//! One kube-rs controller per record kind. Each watches its custom resource
//! (cluster-wide, or in `WATCH_NAMESPACE`) and hands every change to the
//! shared [`Reconciler`].

use crate::config::ControllerConfig;
use crate::controller::reconciler::{
    backoff_key, ManagedRecord, RecordRef, Reconciler, ReconcilerError,
};
use crate::controller::server::ServerState;
use crate::crd::{Alert, Role, RoleMapping, User};
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube::Client;
use kube_runtime::{controller, controller::Action, watcher, Controller};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Run the four controllers until a shutdown signal arrives
pub async fn run_watch_loops(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let namespace = config.watch_namespace.as_deref();
    let concurrency = config.max_concurrent_reconciliations;
    match namespace {
        Some(ns) => info!("Watching records in namespace '{}'", ns),
        None => info!("Watching records in all namespaces"),
    }

    tokio::spawn(mark_unready_on_signal(
        tokio::signal::ctrl_c(),
        Arc::clone(&server_state),
    ));

    server_state.set_ready(true);

    tokio::join!(
        run_controller::<Alert>(records(&client, namespace), Arc::clone(&reconciler), concurrency),
        run_controller::<Role>(records(&client, namespace), Arc::clone(&reconciler), concurrency),
        run_controller::<User>(records(&client, namespace), Arc::clone(&reconciler), concurrency),
        run_controller::<RoleMapping>(records(&client, namespace), reconciler, concurrency),
    );

    server_state.set_ready(false);
    info!("Controllers stopped gracefully");
    Ok(())
}

/// Drop readiness once `signal` resolves
///
/// A signal listener that fails to register leaves readiness alone; it drops
/// when the controllers stop.
async fn mark_unready_on_signal<F>(signal: F, server_state: Arc<ServerState>)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
    server_state.set_ready(false);
    info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
}

fn records<K: ManagedRecord>(client: &Client, namespace: Option<&str>) -> Api<K> {
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

async fn run_controller<K: ManagedRecord>(
    records: Api<K>,
    reconciler: Arc<Reconciler>,
    concurrency: u16,
) {
    let kind = K::KIND;
    info!(%kind, concurrency, "Starting controller");

    Controller::new(records, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal()
        .run(
            reconcile_record::<K>,
            handle_reconciliation_error::<K, _, _>,
            reconciler,
        )
        .for_each(|result| {
            match result {
                Ok((object, action)) => {
                    debug!(%kind, name = %object.name, ?action, "watch.event.success");
                }
                Err(e) => warn!(%kind, "Controller event error: {}", e),
            }
            futures::future::ready(())
        })
        .await;

    info!(%kind, "Controller stream ended");
}

async fn reconcile_record<K: ManagedRecord>(
    obj: Arc<K>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let record = RecordRef::from_resource(obj.as_ref());
    let outcome = ctx.reconcile::<K>(&record).await?;
    ctx.reset_backoff(&backoff_key(K::KIND, &record.namespace, &record.name));
    Ok(ctx.action_for(outcome))
}
