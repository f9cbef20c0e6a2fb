//! Identity and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller identity from trusted gateway headers.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
