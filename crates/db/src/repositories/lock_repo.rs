//! Lease operations on the `zones` lock columns.
//!
//! The lease lives in two columns on the zone row itself rather than a
//! separate table, so checkout is a single guarded UPDATE: the row either
//! transitions to the new holder atomically or stays untouched. There is no
//! read-then-write window for two writers to race through.

use sqlx::{PgConnection, PgPool};
use zonal_core::types::{DbId, Timestamp};

use crate::models::zone::Zone;
use crate::repositories::zone_repo::COLUMNS;

/// Provides lease acquisition, release, and cleanup for zones.
pub struct LockRepo;

impl LockRepo {
    /// Attempt to acquire or renew the edit lease on a zone.
    ///
    /// Succeeds when the zone is live and its lock is free, expired, or
    /// already held by this actor (renewal restarts the full duration).
    /// Returns `None` when the zone does not exist, is deleted, or a
    /// different actor holds a live lease; the caller re-reads the row to
    /// tell those cases apart.
    pub async fn checkout(
        pool: &PgPool,
        id: DbId,
        actor: &str,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Result<Option<Zone>, sqlx::Error> {
        let query = format!(
            "UPDATE zones SET locked_by = $2, lock_expires_at = $3 \
             WHERE id = $1 AND deleted_at IS NULL \
               AND (locked_by IS NULL OR locked_by = $2 \
                    OR lock_expires_at IS NULL OR lock_expires_at <= $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .bind(actor)
            .bind(expires_at)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Clear the lock columns inside a lifecycle transaction.
    pub async fn clear(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE zones SET locked_by = NULL, lock_expires_at = NULL WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Clear every expired lock. Returns the number of rows touched.
    ///
    /// Read and write paths always re-derive liveness against `now`, so this
    /// only tidies stale columns; nothing depends on it running.
    pub async fn sweep_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE zones SET locked_by = NULL, lock_expires_at = NULL \
             WHERE locked_by IS NOT NULL AND lock_expires_at <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
