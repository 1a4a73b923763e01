//! # User
//!
//! Internal users of the remote security plugin, addressed by record name.

use crate::crd::SyncStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "security.search-operator.io",
    version = "v1alpha1",
    kind = "User",
    namespaced,
    status = "SyncStatus",
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#
)]
pub struct UserSpec {
    /// Plain-text password, hashed by the remote platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-computed password hash, used instead of `password`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opendistro_security_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("hash", &self.hash.as_ref().map(|_| "***"))
            .field("backend_roles", &self.backend_roles)
            .field("opendistro_security_roles", &self.opendistro_security_roles)
            .field("attributes", &self.attributes)
            .field("description", &self.description)
            .finish()
    }
}
