//! # Wire Payloads
//!
//! Request and response bodies of the remote administrative API.
//!
//! Security-plugin payloads (roles, role mappings) are also decoded from GET
//! responses for drift detection, so every list is optional: the remote side
//! may omit a list, send `null` or send `[]`, and all three mean the same.
//! [`Normalize`] folds those spellings into one before comparison.

use crate::crd::{MonitorSchedule, MonitorTrigger};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::BTreeMap;

/// Canonical form used by structural comparison
pub trait Normalize {
    /// Fold empty lists and empty strings into `None`
    #[must_use]
    fn normalize(self) -> Self;
}

fn list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value.filter(|items| !items.is_empty())
}

fn text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Alerting monitor body for `POST`/`PUT` on the monitors collection
#[derive(Debug, Serialize)]
pub struct AlertPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub enabled: bool,
    pub schedule: MonitorSchedule,
    pub inputs: Vec<AlertInputPayload>,
    pub triggers: Vec<MonitorTrigger>,
}

#[derive(Debug, Serialize)]
pub struct AlertInputPayload {
    pub search: AlertSearchPayload,
}

#[derive(Debug, Serialize)]
pub struct AlertSearchPayload {
    pub indices: Vec<String>,
    /// Query DSL embedded verbatim as JSON
    pub query: Box<RawValue>,
}

/// Security role body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub cluster_permissions: Option<Vec<String>>,
    #[serde(default)]
    pub index_permissions: Option<Vec<IndexPermissionPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_permissions: Option<Vec<TenantPermissionPayload>>,
}

impl Normalize for RolePayload {
    fn normalize(self) -> Self {
        Self {
            description: text(self.description),
            cluster_permissions: list(self.cluster_permissions),
            index_permissions: self
                .index_permissions
                .map(|perms| perms.into_iter().map(Normalize::normalize).collect::<Vec<_>>())
                .filter(|perms| !perms.is_empty()),
            tenant_permissions: self
                .tenant_permissions
                .map(|perms| perms.into_iter().map(Normalize::normalize).collect::<Vec<_>>())
                .filter(|perms| !perms.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPermissionPayload {
    #[serde(default)]
    pub index_patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dls: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_fields: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_actions: Option<Vec<String>>,
}

impl Normalize for IndexPermissionPayload {
    fn normalize(self) -> Self {
        Self {
            index_patterns: list(self.index_patterns),
            dls: text(self.dls),
            fls: list(self.fls),
            masked_fields: list(self.masked_fields),
            allowed_actions: list(self.allowed_actions),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPermissionPayload {
    #[serde(default)]
    pub tenant_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_actions: Option<Vec<String>>,
}

impl Normalize for TenantPermissionPayload {
    fn normalize(self) -> Self {
        Self {
            tenant_patterns: list(self.tenant_patterns),
            allowed_actions: list(self.allowed_actions),
        }
    }
}

/// Role mapping body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMappingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Normalize for RoleMappingPayload {
    fn normalize(self) -> Self {
        Self {
            backend_roles: list(self.backend_roles),
            users: list(self.users),
            hosts: list(self.hosts),
            description: text(self.description),
        }
    }
}

/// Internal user body
#[derive(Clone, Default, Serialize)]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opendistro_security_roles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl std::fmt::Debug for UserPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPayload")
            .field("backend_roles", &self.backend_roles)
            .field("opendistro_security_roles", &self.opendistro_security_roles)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
