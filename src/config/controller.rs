//! # Controller Configuration
//!
//! Runtime tuning loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_METRICS_PORT,
    DEFAULT_ROLE_MAPPING_FOLLOW_UP_SECS,
};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port of the metrics and probe server
    pub metrics_port: u16,
    /// Log format (`text` or `json`)
    pub log_format: LogFormat,
    /// Timeout for one remote API exchange (seconds)
    pub http_timeout_secs: u64,
    /// First retry delay after a failed reconcile (seconds)
    pub backoff_min_secs: u64,
    /// Upper bound of the retry delay (seconds)
    pub backoff_max_secs: u64,
    /// Requeue delay after a role is first created, so its mapping follows (seconds)
    pub role_mapping_follow_up_secs: u64,
    /// Maximum records of one kind reconciled in parallel
    pub max_concurrent_reconciliations: u16,
    /// Restrict the watch to one namespace; `None` watches all namespaces
    pub watch_namespace: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            log_format: LogFormat::Text,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            role_mapping_follow_up_secs: DEFAULT_ROLE_MAPPING_FOLLOW_UP_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let backoff_min_secs = parsed_or(&lookup, "BACKOFF_MIN_SECS", defaults.backoff_min_secs);
        let backoff_max_secs = parsed_or(&lookup, "BACKOFF_MAX_SECS", defaults.backoff_max_secs);
        Self {
            metrics_port: parsed_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            log_format: lookup("LOG_FORMAT").map_or(defaults.log_format, |v| LogFormat::parse(&v)),
            http_timeout_secs: parsed_or(&lookup, "HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            backoff_min_secs,
            // max >= min
            backoff_max_secs: backoff_max_secs.max(backoff_min_secs),
            role_mapping_follow_up_secs: parsed_or(
                &lookup,
                "ROLE_MAPPING_FOLLOW_UP_SECS",
                defaults.role_mapping_follow_up_secs,
            ),
            max_concurrent_reconciliations: parsed_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn role_mapping_follow_up(&self) -> Duration {
        Duration::from_secs(self.role_mapping_follow_up_secs)
    }
}

/// Read a key and parse it, falling back to `default` when unset or malformed
fn parsed_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
