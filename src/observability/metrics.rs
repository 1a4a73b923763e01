//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `search_security_reconciliations_total{kind}` - Total number of reconciliations
//! - `search_security_reconciliation_errors_total{kind}` - Reconciliations that returned an error
//! - `search_security_reconciliation_duration_seconds{kind}` - Duration of reconciliations
//! - `search_security_remote_requests_total{method,outcome}` - Remote API requests by outcome
//! - `search_security_remote_request_duration_seconds{method}` - Duration of remote API requests
//! - `search_security_remote_writes_total{kind,operation}` - Create/update writes issued
//! - `search_security_drift_detected_total{kind}` - Drift checks that found a difference
//! - `search_security_finalizations_total{kind,result}` - Remote deletions during finalization
//! - `search_security_requeues_total{reason}` - Requeues scheduled by the operator

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_reconciliations_total",
            "Total number of reconciliations by record kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_reconciliation_errors_total",
            "Total number of reconciliation errors by record kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "search_security_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REMOTE_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_remote_requests_total",
            "Total number of remote admin API requests by method and outcome",
        ),
        &["method", "outcome"],
    )
    .expect("Failed to create REMOTE_REQUESTS_TOTAL metric - this should never happen")
});

static REMOTE_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "search_security_remote_request_duration_seconds",
            "Duration of remote admin API requests in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method"],
    )
    .expect("Failed to create REMOTE_REQUEST_DURATION metric - this should never happen")
});

static REMOTE_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_remote_writes_total",
            "Total number of create/update writes issued by record kind",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create REMOTE_WRITES_TOTAL metric - this should never happen")
});

static DRIFT_DETECTED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_drift_detected_total",
            "Total number of drift checks that found the remote object out of date",
        ),
        &["kind"],
    )
    .expect("Failed to create DRIFT_DETECTED_TOTAL metric - this should never happen")
});

static FINALIZATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_finalizations_total",
            "Total number of finalizations by record kind and result",
        ),
        &["kind", "result"],
    )
    .expect("Failed to create FINALIZATIONS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "search_security_requeues_total",
            "Total number of requeues scheduled by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REMOTE_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REMOTE_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(REMOTE_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DRIFT_DETECTED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FINALIZATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

pub fn record_remote_request(method: &str, outcome: &str, duration: f64) {
    REMOTE_REQUESTS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
    REMOTE_REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration);
}

pub fn increment_remote_writes(kind: &str, operation: &str) {
    REMOTE_WRITES_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}

pub fn increment_drift_detected(kind: &str) {
    DRIFT_DETECTED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_finalizations(kind: &str, result: &str) {
    FINALIZATIONS_TOTAL.with_label_values(&[kind, result]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
