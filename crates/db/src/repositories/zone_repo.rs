//! Repository for the `zones` table.

use sqlx::{PgConnection, PgExecutor, PgPool};
use zonal_core::types::{DbId, Timestamp};

use crate::models::zone::Zone;

/// Column list for `zones` queries.
pub(crate) const COLUMNS: &str = "id, geometry, category_id, description, \
                                  created_by, created_at, updated_by, updated_at, \
                                  deleted_by, deleted_at, locked_by, lock_expires_at";

/// Provides row operations for zones.
///
/// Writes take `&mut PgConnection`: every mutation of a zone row commits in
/// the same transaction as its audit entry, so the lifecycle layer owns the
/// transaction and repositories never commit on their own.
pub struct ZoneRepo;

impl ZoneRepo {
    /// Insert a new zone row, unlocked and not deleted.
    pub async fn insert(
        conn: &mut PgConnection,
        geometry: &serde_json::Value,
        category_id: DbId,
        description: Option<&str>,
        created_by: &str,
        now: Timestamp,
    ) -> Result<Zone, sqlx::Error> {
        let query = format!(
            "INSERT INTO zones (geometry, category_id, description, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(geometry)
            .bind(category_id)
            .bind(description)
            .bind(created_by)
            .bind(now)
            .fetch_one(conn)
            .await
    }

    /// Get a zone by id, or `None` if it does not exist or is soft-deleted.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Zone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zones WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Get a live zone and hold its row lock until the transaction ends.
    ///
    /// Mutations read through this so two writers to the same zone line up
    /// behind one another instead of interleaving their checks.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Zone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM zones WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List all active zones, oldest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Zone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM zones WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Zone>(&query).fetch_all(pool).await
    }

    /// Ids and stored geometries of all active zones, optionally excluding
    /// one zone (the one being updated).
    pub async fn active_geometries(
        executor: impl PgExecutor<'_>,
        exclude: Option<DbId>,
    ) -> Result<Vec<(DbId, serde_json::Value)>, sqlx::Error> {
        sqlx::query_as::<_, (DbId, serde_json::Value)>(
            "SELECT id, geometry FROM zones \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR id <> $1)",
        )
        .bind(exclude)
        .fetch_all(executor)
        .await
    }

    /// Apply an update patch to a zone row.
    ///
    /// `None` fields keep their current value. The write also stamps the
    /// updater and clears the lock columns: a successful update ends the
    /// holder's lease.
    pub async fn apply_update(
        conn: &mut PgConnection,
        id: DbId,
        geometry: Option<&serde_json::Value>,
        category_id: Option<DbId>,
        description: Option<&str>,
        updated_by: &str,
        now: Timestamp,
    ) -> Result<Zone, sqlx::Error> {
        let query = format!(
            "UPDATE zones SET \
                geometry = COALESCE($2, geometry), \
                category_id = COALESCE($3, category_id), \
                description = COALESCE($4, description), \
                updated_by = $5, \
                updated_at = $6, \
                locked_by = NULL, \
                lock_expires_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .bind(geometry)
            .bind(category_id)
            .bind(description)
            .bind(updated_by)
            .bind(now)
            .fetch_one(conn)
            .await
    }

    /// Soft-delete a zone: set the tombstone, stamp the deleter, clear the
    /// lock columns. The row itself is never removed.
    pub async fn soft_delete(
        conn: &mut PgConnection,
        id: DbId,
        deleted_by: &str,
        now: Timestamp,
    ) -> Result<Zone, sqlx::Error> {
        let query = format!(
            "UPDATE zones SET \
                deleted_by = $2, \
                deleted_at = $3, \
                locked_by = NULL, \
                lock_expires_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .bind(deleted_by)
            .bind(now)
            .fetch_one(conn)
            .await
    }
}
