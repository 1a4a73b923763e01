//! # Drift Detection
//!
//! Decides whether a by-name remote object has to be (re)written.
//!
//! The security plugin answers `GET {collection}/{name}` with an object keyed
//! by the record name:
//!
//! ```json
//! { "readers": { "reserved": false, "backend_roles": ["readers"] } }
//! ```
//!
//! The entry is decoded into the same payload type that is sent on writes,
//! which drops bookkeeping fields such as `reserved`, `hidden` and `static`.
//! Both sides are normalized before comparison; list order is significant.

use crate::client::{AdminApi, ApiMethod};
use crate::controller::reconciler::types::ReconcilerError;
use crate::translate::Normalize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Result of an existence check against the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    /// 2xx, with the raw response body
    Present(String),
    /// 404
    Absent,
}

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("failed to decode remote object '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Probe `path` with a GET
///
/// Only a 404 means absent. Any other non-2xx status is a hard error.
pub async fn exists<A: AdminApi + ?Sized>(
    api: &A,
    path: &str,
) -> Result<Existence, ReconcilerError> {
    let response = api.execute(ApiMethod::Get, path, None).await?;

    if response.is_success() {
        Ok(Existence::Present(response.body))
    } else if response.is_not_found() {
        Ok(Existence::Absent)
    } else {
        Err(ReconcilerError::ExistenceCheckFailed {
            path: path.to_string(),
            status: response.status,
            body: response.body,
        })
    }
}

/// Whether the remote entry for `name` differs from `desired`
///
/// A body without an entry for `name` needs a write.
pub fn needs_write<P>(remote: &str, name: &str, desired: &P) -> Result<bool, DriftError>
where
    P: DeserializeOwned + Normalize + PartialEq + Clone,
{
    let decode_error = |source| DriftError::Decode {
        name: name.to_string(),
        source,
    };

    let mut objects: Map<String, Value> = serde_json::from_str(remote).map_err(decode_error)?;
    let Some(entry) = objects.remove(name) else {
        debug!(%name, "Remote response has no entry for record");
        return Ok(true);
    };

    let current: P = serde_json::from_value(entry).map_err(decode_error)?;
    Ok(current.normalize() != desired.clone().normalize())
}
