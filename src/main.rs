//! # Search Security Operator
//!
//! Kubernetes operator that synchronizes `Alert`, `Role`, `User` and
//! `RoleMapping` custom resources with an OpenDistro-style admin REST API.
//!
//! ## Endpoints
//!
//! - `/metrics` - Prometheus metrics
//! - `/healthz` - Liveness probe
//! - `/readyz` - Readiness probe

use anyhow::Result;
use search_security_operator::runtime::{initialization, watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialization::initialize().await?;

    watch_loop::run_watch_loops(init.client, init.reconciler, init.server_state, &init.config)
        .await
}
