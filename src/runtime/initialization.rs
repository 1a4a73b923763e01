//! # Initialization
//!
//! Builds every long-lived value before the watch loops start. Nothing here
//! is global: the API client and record store are moved into the
//! [`Reconciler`] that all four controllers share.

use crate::client::SearchApiClient;
use crate::config::{ControllerConfig, RemoteApiConfig};
use crate::controller::reconciler::{KubeStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("reconciler", &self.reconciler)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Bring the operator up in order: TLS provider, runtime config and logging,
/// metrics and probe server, remote API client, Kubernetes client, reconciler
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    let config = ControllerConfig::from_env();
    observability::logging::init_tracing(config.log_format)
        .context("Failed to initialize tracing")?;

    info!("Starting search security operator");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(metrics_port, server_state_clone).await {
            error!(error = %e, "Probe server stopped");
        }
    });

    let remote = RemoteApiConfig::load().context("Failed to load remote API configuration")?;
    info!(
        endpoint = %remote.endpoint,
        extra_ca = remote.extra_ca_cert_file.is_some(),
        "Remote API configuration loaded"
    );
    let api = SearchApiClient::new(&remote, config.http_timeout())
        .context("Failed to build remote API client")?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let reconciler = Arc::new(
        Reconciler::new(api, KubeStore::new(client.clone()), remote.paths())
            .with_follow_up(config.role_mapping_follow_up())
            .with_backoff(config.backoff_min_secs, config.backoff_max_secs),
    );

    info!("Controller initialized, starting watch loops...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        config,
    })
}
