//! # Reconciler
//!
//! Core reconciliation logic for `Alert`, `Role`, `User` and `RoleMapping`
//! records.
//!
//! The reconciler:
//! - Loads the record and runs the finalizer lifecycle
//! - Translates the spec into the remote API payload
//! - Decides whether a write is needed (per-kind [`WriteStrategy`])
//! - Issues the write through the injected [`AdminApi`](crate::client::AdminApi)
//! - Writes the outcome back into the record status

pub mod drift;
pub mod kind;
pub mod lifecycle;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod types;

pub use drift::{DriftError, Existence};
pub use kind::{Identity, ManagedRecord, RecordKind, WriteStrategy};
pub use lifecycle::LifecyclePhase;
pub use store::{status_patch, KubeStore, RecordRef, RecordStore, StoreError};
pub use types::{backoff_key, ReconcileOutcome, Reconciler, ReconcilerError};
