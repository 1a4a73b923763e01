//! # HTTP Admin API Client
//!
//! `reqwest`-based implementation of [`AdminApi`].
//!
//! The client is built once at startup from [`RemoteApiConfig`] and shared
//! read-only by every reconciler. It trusts the built-in web PKI roots plus,
//! optionally, every certificate of an extra PEM bundle.

use super::{redact_secrets, AdminApi, ApiError, ApiMethod, ApiResponse};
use crate::config::{Credentials, RemoteApiConfig};
use crate::constants::JSON_CONTENT_TYPE;
use crate::observability::metrics;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, trace, Instrument};

const USER_AGENT: &str = concat!("search-security-operator/", env!("CARGO_PKG_VERSION"));

/// Administrative API client for the remote search platform
pub struct SearchApiClient {
    http_client: Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for SearchApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchApiClient")
            .field("base_url", &self.base_url)
            .field("username", &self.credentials.username)
            .finish_non_exhaustive()
    }
}

impl SearchApiClient {
    /// Build the client from configuration
    ///
    /// Fails if the extra CA bundle cannot be read or parsed.
    pub fn new(config: &RemoteApiConfig, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT).timeout(timeout);

        if let Some(pem) = config
            .read_extra_ca()
            .context("Failed to load extra CA certificate file")?
        {
            let certificates = reqwest::Certificate::from_pem_bundle(&pem)
                .context("Failed to parse extra CA certificate bundle")?;
            debug!(count = certificates.len(), "Trusting extra CA certificates");
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        let http_client = builder
            .build()
            .context("Failed to build remote API HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.endpoint.trim().trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn make_request(
        &self,
        method: ApiMethod,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> reqwest::RequestBuilder {
        let request = match method {
            ApiMethod::Get => self.http_client.get(url),
            ApiMethod::Post => self.http_client.post(url),
            ApiMethod::Put => self.http_client.put(url),
            ApiMethod::Delete => self.http_client.delete(url),
        };

        let request = request
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);

        match body {
            Some(body) => request.body(body),
            None => request,
        }
    }
}

#[async_trait]
impl AdminApi for SearchApiClient {
    async fn execute(
        &self,
        method: ApiMethod,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path);
        let span = debug_span!("remote.request", method = %method, path = %path);

        async move {
            if let Some(body) = &body {
                trace!(
                    request_body = %redact_secrets(&String::from_utf8_lossy(body)),
                    "Sending remote API request"
                );
            }

            let start = Instant::now();
            let transport_error = |source: reqwest::Error| ApiError::Transport {
                method,
                path: path.to_string(),
                source,
            };

            let response = match self.make_request(method, &url, body).send().await {
                Ok(response) => response,
                Err(e) => {
                    metrics::record_remote_request(
                        method.as_str(),
                        "transport_error",
                        start.elapsed().as_secs_f64(),
                    );
                    return Err(transport_error(e));
                }
            };

            let status = response.status().as_u16();
            let text = response.text().await.map_err(transport_error)?;
            let api_response = ApiResponse::new(status, text);

            metrics::record_remote_request(
                method.as_str(),
                api_response.outcome.as_str(),
                start.elapsed().as_secs_f64(),
            );
            debug!(
                status,
                outcome = %api_response.outcome,
                response_body = %redact_secrets(&api_response.body),
                "Remote API responded"
            );

            Ok(api_response)
        }
        .instrument(span)
        .await
    }
}
