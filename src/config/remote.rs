//! # Remote API Configuration
//!
//! Connection settings for the search platform's administrative API.
//!
//! Settings come from a YAML file when one exists at `$CONFIG_FILE`
//! (default `./config.yaml`), otherwise from environment variables:
//!
//! | YAML key             | Environment variable                   |
//! |----------------------|----------------------------------------|
//! | `endpoint`           | `ELASTICSEARCH_ENDPOINT`               |
//! | `alertAPIPath`       | `ELASTICSEARCH_ALERT_API_PATH`         |
//! | `roleAPIPath`        | `ELASTICSEARCH_ROLE_API_PATH`          |
//! | `userAPIPath`        | `ELASTICSEARCH_USER_API_PATH`          |
//! | `roleMappingAPIPath` | `ELASTICSEARCH_ROLEMAPPING_API_PATH`   |
//! | `username`           | `ELASTICSEARCH_USERNAME`               |
//! | `password`           | `ELASTICSEARCH_PASSWORD`               |
//! | `extraCACertFile`    | `EXTRA_CA_CERT_FILE`                   |

use crate::constants::{
    DEFAULT_ALERT_API_PATH, DEFAULT_CONFIG_FILE, DEFAULT_ROLE_API_PATH,
    DEFAULT_ROLE_MAPPING_API_PATH, DEFAULT_USER_API_PATH,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const PEM_CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("remote API endpoint is not configured (set ELASTICSEARCH_ENDPOINT)")]
    MissingEndpoint,
    #[error("remote API endpoint '{0}' must start with http:// or https://")]
    InvalidEndpoint(String),
    #[error("CA file {0} contains no PEM certificate")]
    EmptyCaBundle(PathBuf),
}

/// Basic-auth credentials, wiped from memory on drop
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Base paths of the four remote collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    pub alerts: String,
    pub roles: String,
    pub users: String,
    pub role_mappings: String,
}

impl Default for ApiPaths {
    fn default() -> Self {
        Self {
            alerts: DEFAULT_ALERT_API_PATH.to_string(),
            roles: DEFAULT_ROLE_API_PATH.to_string(),
            users: DEFAULT_USER_API_PATH.to_string(),
            role_mappings: DEFAULT_ROLE_MAPPING_API_PATH.to_string(),
        }
    }
}

/// Connection settings for the remote administrative API
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteApiConfig {
    /// Base URL, e.g. `https://search.example.com:9200`
    #[serde(default)]
    pub endpoint: String,
    #[serde(rename = "alertAPIPath", default = "default_alert_path")]
    pub alert_api_path: String,
    #[serde(rename = "roleAPIPath", default = "default_role_path")]
    pub role_api_path: String,
    #[serde(rename = "userAPIPath", default = "default_user_path")]
    pub user_api_path: String,
    #[serde(rename = "roleMappingAPIPath", default = "default_role_mapping_path")]
    pub role_mapping_api_path: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    /// PEM bundle trusted in addition to the built-in roots
    #[serde(rename = "extraCACertFile", default)]
    pub extra_ca_cert_file: Option<PathBuf>,
}

fn default_alert_path() -> String {
    DEFAULT_ALERT_API_PATH.to_string()
}

fn default_role_path() -> String {
    DEFAULT_ROLE_API_PATH.to_string()
}

fn default_user_path() -> String {
    DEFAULT_USER_API_PATH.to_string()
}

fn default_role_mapping_path() -> String {
    DEFAULT_ROLE_MAPPING_API_PATH.to_string()
}

impl RemoteApiConfig {
    /// Load from `$CONFIG_FILE` if present, otherwise from the environment, then validate
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let path = Path::new(&file);
        let config = if path.is_file() {
            tracing::info!(path = %path.display(), "Loading remote API configuration from file");
            Self::from_file(path)?
        } else {
            Self::from_env()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or empty paths take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            endpoint: non_empty("ELASTICSEARCH_ENDPOINT").unwrap_or_default(),
            alert_api_path: non_empty("ELASTICSEARCH_ALERT_API_PATH")
                .unwrap_or_else(default_alert_path),
            role_api_path: non_empty("ELASTICSEARCH_ROLE_API_PATH")
                .unwrap_or_else(default_role_path),
            user_api_path: non_empty("ELASTICSEARCH_USER_API_PATH")
                .unwrap_or_else(default_user_path),
            role_mapping_api_path: non_empty("ELASTICSEARCH_ROLEMAPPING_API_PATH")
                .unwrap_or_else(default_role_mapping_path),
            credentials: Credentials {
                username: lookup("ELASTICSEARCH_USERNAME").unwrap_or_default(),
                password: lookup("ELASTICSEARCH_PASSWORD").unwrap_or_default(),
            },
            extra_ca_cert_file: non_empty("EXTRA_CA_CERT_FILE").map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        if self.credentials.username.is_empty() || self.credentials.password.is_empty() {
            tracing::warn!("Remote API credentials are empty, requests will likely be rejected");
        }
        Ok(())
    }

    /// Read the extra CA bundle, if configured
    pub fn read_extra_ca(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let Some(path) = &self.extra_ca_cert_file else {
            return Ok(None);
        };
        let pem = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if !String::from_utf8_lossy(&pem).contains(PEM_CERTIFICATE_MARKER) {
            return Err(ConfigError::EmptyCaBundle(path.clone()));
        }
        Ok(Some(pem))
    }

    #[must_use]
    pub fn paths(&self) -> ApiPaths {
        ApiPaths {
            alerts: self.alert_api_path.clone(),
            roles: self.role_api_path.clone(),
            users: self.user_api_path.clone(),
            role_mappings: self.role_mapping_api_path.clone(),
        }
    }
}
