//! # Object Translator
//!
//! Reshapes record specs into the payloads the remote API expects.
//!
//! Translation is purely structural, except for alert search queries: they
//! are stored in the record as escaped JSON strings and must be embedded in
//! the payload as raw JSON (see [`sanitize_query`]).

use crate::crd::{AlertSpec, RoleMappingSpec, RoleSpec, UserSpec};
use serde::Serialize;
use serde_json::value::RawValue;
use thiserror::Error;

mod payload;

pub use payload::{
    AlertInputPayload, AlertPayload, AlertSearchPayload, IndexPermissionPayload, Normalize,
    RoleMappingPayload, RolePayload, TenantPermissionPayload, UserPayload,
};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("search query of input {index} is not valid JSON after unescaping: {source}")]
    InvalidQuery {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Unescape a query stored as an escaped JSON string
///
/// Removes every literal `\n` sequence, turns `\"` into `"`, then trims
/// surrounding double quotes.
#[must_use]
pub fn sanitize_query(raw: &str) -> String {
    raw.replace("\\n", "")
        .replace("\\\"", "\"")
        .trim_matches('"')
        .to_string()
}

/// Monitor payload with every search query embedded as raw JSON
pub fn alert_payload(spec: &AlertSpec) -> Result<AlertPayload, TranslateError> {
    let inputs = spec
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let query = RawValue::from_string(sanitize_query(&input.search.query))
                .map_err(|source| TranslateError::InvalidQuery { index, source })?;
            Ok(AlertInputPayload {
                search: AlertSearchPayload {
                    indices: input.search.indices.clone(),
                    query,
                },
            })
        })
        .collect::<Result<Vec<_>, TranslateError>>()?;

    Ok(AlertPayload {
        name: spec.name.clone(),
        monitor_type: spec.monitor_type.clone(),
        enabled: spec.enabled,
        schedule: spec.schedule.clone(),
        inputs,
        triggers: spec.triggers.clone(),
    })
}

#[must_use]
pub fn role_payload(spec: &RoleSpec) -> RolePayload {
    RolePayload {
        description: spec.description.clone(),
        cluster_permissions: Some(spec.cluster_permissions.clone()),
        index_permissions: Some(
            spec.index_permissions
                .iter()
                .map(|perm| IndexPermissionPayload {
                    index_patterns: Some(perm.index_patterns.clone()),
                    dls: perm.dls.clone(),
                    fls: perm.fls.clone(),
                    masked_fields: perm.masked_fields.clone(),
                    allowed_actions: Some(perm.allowed_actions.clone()),
                })
                .collect(),
        ),
        tenant_permissions: spec.tenant_permissions.as_ref().map(|perms| {
            perms
                .iter()
                .map(|perm| TenantPermissionPayload {
                    tenant_patterns: Some(perm.tenant_patterns.clone()),
                    allowed_actions: Some(perm.allowed_actions.clone()),
                })
                .collect()
        }),
    }
}

/// Mapping payload derived from a role's `roleMappings` block
#[must_use]
pub fn role_mapping_from_role(spec: &RoleSpec) -> RoleMappingPayload {
    let mappings = &spec.role_mappings;
    RoleMappingPayload {
        backend_roles: Some(mappings.backend_roles.clone()).filter(|roles| !roles.is_empty()),
        users: mappings.users.clone(),
        hosts: mappings.hosts.clone(),
        description: None,
    }
}

#[must_use]
pub fn role_mapping_payload(spec: &RoleMappingSpec) -> RoleMappingPayload {
    RoleMappingPayload {
        backend_roles: spec.backend_roles.clone(),
        users: spec.users.clone(),
        hosts: spec.hosts.clone(),
        description: spec.description.clone(),
    }
}

#[must_use]
pub fn user_payload(spec: &UserSpec) -> UserPayload {
    UserPayload {
        password: spec.password.clone(),
        hash: spec.hash.clone(),
        backend_roles: spec.backend_roles.clone(),
        opendistro_security_roles: spec.opendistro_security_roles.clone(),
        attributes: spec.attributes.clone(),
        description: spec.description.clone(),
    }
}

/// Serialize a payload to a JSON request body
pub fn encode<P: Serialize>(payload: &P) -> Result<Vec<u8>, TranslateError> {
    Ok(serde_json::to_vec(payload)?)
}
