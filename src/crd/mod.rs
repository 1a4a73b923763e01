//! # Custom Resource Definitions
//!
//! Desired-state records watched by the operator, one kind per remote object type:
//!
//! - [`Alert`] - alerting monitor, addressed remotely by an assigned `_id`
//! - [`Role`] - security role, addressed by name, carries its role mapping
//! - [`User`] - internal user, addressed by name
//! - [`RoleMapping`] - standalone role mapping, addressed by role name
//!
//! All kinds share the [`SyncStatus`] status block.

mod alert;
mod role;
mod role_mapping;
mod status;
mod user;

pub use alert::*;
pub use role::*;
pub use role_mapping::*;
pub use status::*;
pub use user::*;
