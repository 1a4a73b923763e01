//! Search Security Operator Library
//!
//! Keeps `Alert`, `Role`, `User` and `RoleMapping` custom resources in sync
//! with the administrative REST API of an OpenDistro-style search platform.
//! Tests are included in the module files and under `tests/`.
//!
//! ## Quick Start
//!
//! ```rust
//! use search_security_operator::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod translate;
