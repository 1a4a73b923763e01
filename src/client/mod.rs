//! # Remote API Client
//!
//! Executes requests against the search platform's administrative REST API.
//!
//! The reconciler only depends on the [`AdminApi`] trait. The production
//! implementation is [`SearchApiClient`]; tests substitute an in-memory fake.
//!
//! Every exchange that reaches the server yields an [`ApiResponse`] whose
//! `outcome` is `Deployed` for HTTP 2xx and `Error` otherwise. Only transport
//! failures surface as [`ApiError`].

use crate::crd::SyncState;
use async_trait::async_trait;
use thiserror::Error;

mod http;
mod response;

pub use http::SearchApiClient;
pub use response::{extract_remote_id, redact_secrets};

/// HTTP methods used against the admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ApiMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an exchange that reached the remote server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// `Deployed` for 2xx, `Error` otherwise
    pub outcome: SyncState,
    /// `_id` field of the response body, empty when absent
    pub remote_id: String,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Build a response from a status code and body, deriving outcome and `_id`
    #[must_use]
    pub fn new(status: u16, body: String) -> Self {
        Self {
            status,
            outcome: SyncState::from_status_code(status),
            remote_id: extract_remote_id(&body),
            body,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == SyncState::Deployed
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: ApiMethod,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Transport failure reported by a non-`reqwest` implementation
    #[error("{method} {path} failed: {message}")]
    Unavailable {
        method: ApiMethod,
        path: String,
        message: String,
    },
}

/// Administrative API of the remote search platform
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Send `body` (if any) to `path` relative to the configured endpoint
    async fn execute(
        &self,
        method: ApiMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
impl<T: AdminApi + ?Sized> AdminApi for std::sync::Arc<T> {
    async fn execute(
        &self,
        method: ApiMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ApiError> {
        (**self).execute(method, path, body).await
    }
}
