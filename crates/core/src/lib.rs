//! Pure domain logic for the collaborative zone editing service.
//!
//! This crate has no I/O: quota derivation, lease classification, geometry
//! validation and overlap detection, audit action constants, and the shared
//! error taxonomy all live here so the repository layer (`zonal-db`) and the
//! HTTP layer (`zonal-api`) can share one set of rules.

pub mod audit;
pub mod category;
pub mod error;
pub mod geometry;
pub mod lease;
pub mod quota;
pub mod types;
