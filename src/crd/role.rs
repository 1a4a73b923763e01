//! # Role
//!
//! Access-control roles, addressed on the remote platform by record name.
//! Each role also carries the backend roles and users mapped onto it.

use crate::crd::SyncStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "security.search-operator.io",
    version = "v1alpha1",
    kind = "Role",
    namespaced,
    status = "SyncStatus",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Role mappings", "type":"string", "jsonPath":".spec.roleMappings.backend_roles"}"#
)]
pub struct RoleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub cluster_permissions: Vec<String>,
    #[serde(default)]
    pub index_permissions: Vec<IndexPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_permissions: Option<Vec<TenantPermissions>>,
    /// Backend roles and users mapped onto this role
    #[serde(rename = "roleMappings", default)]
    pub role_mappings: RoleMappings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct IndexPermissions {
    pub index_patterns: Vec<String>,
    /// Document-level security query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dls: Option<String>,
    /// Field-level security
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_fields: Option<Vec<String>>,
    pub allowed_actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct TenantPermissions {
    pub tenant_patterns: Vec<String>,
    pub allowed_actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct RoleMappings {
    #[serde(default)]
    pub backend_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
}
