//! Periodic sweep of expired edit leases.
//!
//! Clears lock columns whose expiry has passed so stale holders do not
//! linger in the table. Correctness never depends on this job: every lease
//! check compares `lock_expires_at` against the current time, so an expired
//! lease is already treated as free before the sweeper gets to it. Runs on
//! a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use zonal_db::repositories::LockRepo;

/// Run the lease sweep loop.
///
/// Clears expired lock rows every `interval`. Runs until `cancel` is
/// triggered.
pub async fn run(pool: PgPool, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Lock sweeper started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lock sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                match LockRepo::sweep_expired(&pool, Utc::now()).await {
                    Ok(swept) => {
                        if swept > 0 {
                            tracing::info!(swept, "Lock sweeper: cleared expired leases");
                        } else {
                            tracing::debug!("Lock sweeper: nothing to clear");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Lock sweeper: sweep failed");
                    }
                }
            }
        }
    }
}
