//! HTTP surface for the zone editing service.
//!
//! Exposes the zone lifecycle (create, update, soft delete), edit leases,
//! quota introspection, category administration, and the audit history as a
//! JSON API under `/api/v1`. Domain rules live in `zonal-core`, persistence
//! in `zonal-db`; this crate only maps HTTP to those layers and publishes
//! post-commit events on the in-process bus.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
