//! # Alert
//!
//! Alert monitor records. The remote alerting API assigns an opaque `_id`
//! on creation, which is kept in `status.id`.

use crate::constants::DEFAULT_MONITOR_TYPE;
use crate::crd::SyncStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Alert monitor definition
///
/// # Example
///
/// ```yaml
/// apiVersion: security.search-operator.io/v1alpha1
/// kind: Alert
/// metadata:
///   name: error-rate
/// spec:
///   name: error-rate
///   enabled: true
///   schedule:
///     period: { interval: 5, unit: MINUTES }
///   inputs:
///     - search:
///         indices: ["logs-*"]
///         query: "{\"size\": 0, \"query\": {\"match\": {\"level\": \"error\"}}}"
///   triggers: []
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "security.search-operator.io",
    version = "v1alpha1",
    kind = "Alert",
    namespaced,
    status = "SyncStatus",
    printcolumn = r#"{"name":"Enabled", "type":"boolean", "jsonPath":".spec.enabled"}"#,
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"ID", "type":"string", "jsonPath":".status.id"}"#
)]
pub struct AlertSpec {
    /// Monitor name on the remote platform
    pub name: String,
    /// Monitor type
    #[serde(rename = "type", default = "default_monitor_type")]
    pub monitor_type: String,
    pub enabled: bool,
    pub schedule: MonitorSchedule,
    pub inputs: Vec<MonitorInput>,
    pub triggers: Vec<MonitorTrigger>,
}

fn default_monitor_type() -> String {
    DEFAULT_MONITOR_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct MonitorSchedule {
    pub period: SchedulePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SchedulePeriod {
    pub interval: i64,
    /// One of `MINUTES`, `HOURS`, `DAYS`
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct MonitorInput {
    pub search: InputSearch,
}

/// Search input of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct InputSearch {
    pub indices: Vec<String>,
    /// Query DSL as an escaped JSON string, unescaped before sending
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct MonitorTrigger {
    pub name: String,
    pub severity: String,
    pub condition: TriggerCondition,
    #[serde(default)]
    pub actions: Vec<TriggerAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TriggerCondition {
    pub script: Script,
}

/// Script or template body with its language
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Script {
    pub source: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TriggerAction {
    pub name: String,
    /// Alerting destination the action notifies
    #[serde(default)]
    pub destination_id: String,
    pub subject_template: Script,
    pub message_template: Script,
}
