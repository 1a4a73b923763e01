//! # Configuration
//!
//! - [`RemoteApiConfig`] - remote platform endpoint, paths, credentials and trust anchor
//! - [`ControllerConfig`] - runtime tuning (ports, timeouts, backoff, concurrency)

mod controller;
mod remote;

pub use controller::{ControllerConfig, LogFormat};
pub use remote::{ApiPaths, ConfigError, Credentials, RemoteApiConfig};
