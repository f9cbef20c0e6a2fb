//! Shared application state for Axum handlers.

use std::sync::Arc;

use zonal_db::DbPool;
use zonal_events::EventBus;

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
///
/// Cloned per request by Axum; everything inside is either a cheap handle
/// (`DbPool`) or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: DbPool,
    /// Server configuration loaded at startup.
    pub config: Arc<ServerConfig>,
    /// In-process bus for post-commit domain events.
    pub event_bus: Arc<EventBus>,
}
