//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use search_security_operator::prelude::*;
//! ```
//!
//! This brings into scope:
//! - All CRD types (`Alert`, `Role`, `User`, `RoleMapping`, `SyncStatus`, ...)
//! - The remote API client and its trait
//! - Reconciler types (`Reconciler`, `ReconcilerError`, `ManagedRecord`, ...)
//! - Config types

pub use crate::crd::*;

pub use crate::client::{AdminApi, ApiError, ApiMethod, ApiResponse, SearchApiClient};

pub use crate::controller::reconciler::{
    KubeStore, ManagedRecord, RecordKind, RecordRef, RecordStore, ReconcileOutcome, Reconciler,
    ReconcilerError, StoreError,
};

pub use crate::config::{ApiPaths, ConfigError, ControllerConfig, RemoteApiConfig};

pub use crate::translate::TranslateError;
