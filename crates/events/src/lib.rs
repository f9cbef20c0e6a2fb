//! Zonal event bus.
//!
//! Post-commit notification plumbing for the zone editing service:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ZoneEvent`]: the canonical domain event envelope.
//!
//! Events are fire-and-forget: handlers publish strictly after their
//! transaction commits, and a publish failure never affects the committed
//! mutation. Subscribers get at-least-once delivery while they keep up with
//! the channel buffer.

pub mod bus;

pub use bus::{kinds, EventBus, ZoneEvent};
