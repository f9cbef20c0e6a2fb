//! PostgreSQL persistence for the zone editing service.
//!
//! Layout mirrors the domain split:
//! - [`models`]: row structs and request DTOs
//! - [`repositories`]: table-scoped query helpers
//! - [`lifecycle`]: transactional orchestration of zone mutations
//!
//! Every mutation commits the zone row change and its audit ledger entry in
//! one transaction; a failure at any gate rolls the whole thing back.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repositories;

pub use error::DbError;
pub use lifecycle::{DeletionOutcome, ZoneLifecycle};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap liveness probe used by startup and the health endpoint.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
