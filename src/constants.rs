//! # Constants
//!
//! Default values and well-known names shared across the operator.

/// API group of every custom resource managed by the operator
pub const API_GROUP: &str = "security.search-operator.io";

/// API version of every custom resource managed by the operator
pub const API_VERSION: &str = "v1alpha1";

/// Field manager used for status and finalizer patches
pub const FIELD_MANAGER: &str = "search-security-operator";

/// Finalizer marker attached to `Alert` records
pub const FINALIZER_ALERT: &str = "alert.security.search-operator.io/finalizer";

/// Finalizer marker attached to `Role` records
pub const FINALIZER_ROLE: &str = "role.security.search-operator.io/finalizer";

/// Finalizer marker attached to `User` records
pub const FINALIZER_USER: &str = "user.security.search-operator.io/finalizer";

/// Finalizer marker attached to `RoleMapping` records
pub const FINALIZER_ROLE_MAPPING: &str = "rolemapping.security.search-operator.io/finalizer";

/// Default alerting monitors path
pub const DEFAULT_ALERT_API_PATH: &str = "_opendistro/_alerting/monitors";

/// Default security roles path
pub const DEFAULT_ROLE_API_PATH: &str = "_opendistro/_security/api/roles";

/// Default internal users path
pub const DEFAULT_USER_API_PATH: &str = "_opendistro/_security/api/internalusers";

/// Default role mappings path
pub const DEFAULT_ROLE_MAPPING_API_PATH: &str = "_opendistro/_security/api/rolesmapping";

/// Default location of the optional YAML configuration file
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default port for the metrics and probe server
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default timeout for a single remote API exchange (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default minimum error backoff (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum error backoff (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Delay before the follow-up reconcile of a freshly created role (seconds)
pub const DEFAULT_ROLE_MAPPING_FOLLOW_UP_SECS: u64 = 5;

/// Default number of records of one kind reconciled in parallel
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 4;

/// Default monitor type for alerts
pub const DEFAULT_MONITOR_TYPE: &str = "monitor";

/// Content type sent with every remote API request
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
