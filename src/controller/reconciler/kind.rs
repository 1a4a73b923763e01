//! # Record Kinds
//!
//! Per-kind capabilities consumed by the generic reconciler.
//!
//! | Kind          | Identity         | Write strategy     | Remote collection |
//! |---------------|------------------|--------------------|-------------------|
//! | `Alert`       | assigned `_id`   | create then update | alerts            |
//! | `Role`        | record name      | drift checked      | roles             |
//! | `User`        | record name      | unconditional      | users             |
//! | `RoleMapping` | record name      | drift checked      | role mappings     |

use crate::config::ApiPaths;
use crate::constants::{FINALIZER_ALERT, FINALIZER_ROLE, FINALIZER_ROLE_MAPPING, FINALIZER_USER};
use crate::controller::reconciler::drift::{self, DriftError};
use crate::crd::{Alert, Role, RoleMapping, SyncStatus, User};
use crate::translate::{self, AlertPayload, RoleMappingPayload, RolePayload, TranslateError, UserPayload};
use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How a remote object is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// `{base}/{record name}`
    ByName,
    /// `{base}/{status.id}`, where the id is assigned by the remote API on `POST {base}`
    ByAssignedId,
}

/// How the reconciler decides whether to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// `POST` when no id is stored, `PUT` once per new generation afterwards
    CreateThenUpdate,
    /// `GET`, then `PUT` when absent or drifted
    DriftChecked,
    /// `PUT` on every reconcile
    Unconditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Alert,
    Role,
    User,
    RoleMapping,
}

impl RecordKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Alert => "Alert",
            RecordKind::Role => "Role",
            RecordKind::User => "User",
            RecordKind::RoleMapping => "RoleMapping",
        }
    }

    #[must_use]
    pub fn identity(&self) -> Identity {
        match self {
            RecordKind::Alert => Identity::ByAssignedId,
            RecordKind::Role | RecordKind::User | RecordKind::RoleMapping => Identity::ByName,
        }
    }

    #[must_use]
    pub fn write_strategy(&self) -> WriteStrategy {
        match self {
            RecordKind::Alert => WriteStrategy::CreateThenUpdate,
            RecordKind::Role | RecordKind::RoleMapping => WriteStrategy::DriftChecked,
            RecordKind::User => WriteStrategy::Unconditional,
        }
    }

    #[must_use]
    pub fn finalizer(&self) -> &'static str {
        match self {
            RecordKind::Alert => FINALIZER_ALERT,
            RecordKind::Role => FINALIZER_ROLE,
            RecordKind::User => FINALIZER_USER,
            RecordKind::RoleMapping => FINALIZER_ROLE_MAPPING,
        }
    }

    #[must_use]
    pub fn base_path<'a>(&self, paths: &'a ApiPaths) -> &'a str {
        match self {
            RecordKind::Alert => &paths.alerts,
            RecordKind::Role => &paths.roles,
            RecordKind::User => &paths.users,
            RecordKind::RoleMapping => &paths.role_mappings,
        }
    }

    /// `{base}/{id}` where `id` is the record name or the assigned id
    #[must_use]
    pub fn object_path(&self, paths: &ApiPaths, id: &str) -> String {
        format!(
            "{}/{}",
            self.base_path(paths).trim_end_matches('/'),
            id.trim_start_matches('/')
        )
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A desired-state record the generic reconciler can synchronize
pub trait ManagedRecord:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const KIND: RecordKind;

    /// Request body sent on create and update
    type Payload: Serialize + Send + Sync;

    fn translate(&self) -> Result<Self::Payload, TranslateError>;

    fn sync_status(&self) -> Option<&SyncStatus>;

    /// Compare the remote GET response with the desired payload
    ///
    /// Only consulted for [`WriteStrategy::DriftChecked`] kinds.
    fn needs_write(&self, _remote: &str, _desired: &Self::Payload) -> Result<bool, DriftError> {
        Ok(true)
    }

    /// Role mapping that must follow this record on the remote side
    fn dependent_role_mapping(&self) -> Option<RoleMappingPayload> {
        None
    }
}

impl ManagedRecord for Alert {
    const KIND: RecordKind = RecordKind::Alert;
    type Payload = AlertPayload;

    fn translate(&self) -> Result<Self::Payload, TranslateError> {
        translate::alert_payload(&self.spec)
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }
}

impl ManagedRecord for Role {
    const KIND: RecordKind = RecordKind::Role;
    type Payload = RolePayload;

    fn translate(&self) -> Result<Self::Payload, TranslateError> {
        Ok(translate::role_payload(&self.spec))
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }

    fn needs_write(&self, remote: &str, desired: &Self::Payload) -> Result<bool, DriftError> {
        drift::needs_write(remote, &self.name_any(), desired)
    }

    fn dependent_role_mapping(&self) -> Option<RoleMappingPayload> {
        Some(translate::role_mapping_from_role(&self.spec))
    }
}

impl ManagedRecord for User {
    const KIND: RecordKind = RecordKind::User;
    type Payload = UserPayload;

    fn translate(&self) -> Result<Self::Payload, TranslateError> {
        Ok(translate::user_payload(&self.spec))
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }
}

impl ManagedRecord for RoleMapping {
    const KIND: RecordKind = RecordKind::RoleMapping;
    type Payload = RoleMappingPayload;

    fn translate(&self) -> Result<Self::Payload, TranslateError> {
        Ok(translate::role_mapping_payload(&self.spec))
    }

    fn sync_status(&self) -> Option<&SyncStatus> {
        self.status.as_ref()
    }

    fn needs_write(&self, remote: &str, desired: &Self::Payload) -> Result<bool, DriftError> {
        drift::needs_write(remote, &self.name_any(), desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert_eq!(RecordKind::Alert.identity(), Identity::ByAssignedId);
        assert_eq!(RecordKind::User.identity(), Identity::ByName);
        assert_eq!(RecordKind::Alert.write_strategy(), WriteStrategy::CreateThenUpdate);
        assert_eq!(RecordKind::Role.write_strategy(), WriteStrategy::DriftChecked);
        assert_eq!(RecordKind::RoleMapping.write_strategy(), WriteStrategy::DriftChecked);
        assert_eq!(RecordKind::User.write_strategy(), WriteStrategy::Unconditional);
    }

    #[test]
    fn test_base_paths_and_finalizers() {
        let paths = ApiPaths::default();
        assert_eq!(RecordKind::Alert.base_path(&paths), "_opendistro/_alerting/monitors");
        assert_eq!(
            RecordKind::RoleMapping.base_path(&paths),
            "_opendistro/_security/api/rolesmapping"
        );
        assert_eq!(
            RecordKind::User.object_path(&paths, "alice"),
            "_opendistro/_security/api/internalusers/alice"
        );
        assert_eq!(
            RecordKind::Role.finalizer(),
            "role.security.search-operator.io/finalizer"
        );
    }
}
