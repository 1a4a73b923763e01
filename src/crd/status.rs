//! # Sync Status
//!
//! Status block shared by every managed record kind.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of the last remote write for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum SyncState {
    /// The remote API accepted the write (HTTP 2xx)
    Deployed,
    /// The remote API rejected the write, see `error`
    Error,
}

impl SyncState {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status_code(code: u16) -> Self {
        if (200..300).contains(&code) {
            SyncState::Deployed
        } else {
            SyncState::Error
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Deployed => "Deployed",
            SyncState::Error => "Error",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed state of a managed record
///
/// Written only by the operator, after every remote create or update
/// attempt and after rejected remote deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Identifier assigned by the remote API (alerts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Outcome of the last remote write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SyncState>,
    /// Raw response body of the last rejected write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Generation of the record this status describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// RFC 3339 timestamp of the last status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<String>,
}

impl SyncStatus {
    /// Remote identifier, treating an empty string as absent
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Compare everything except the sync timestamp
    #[must_use]
    pub fn same_outcome(&self, other: &SyncStatus) -> bool {
        self.id == other.id
            && self.state == other.state
            && self.error == other.error
            && self.observed_generation == other.observed_generation
    }
}
