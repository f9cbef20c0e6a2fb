//! Repository for the append-only `audit_log` table.

use sqlx::PgExecutor;
use zonal_core::audit::actions;
use zonal_core::quota::LedgerCounts;
use zonal_core::types::{DbId, Timestamp};

use crate::models::audit::{AppendAuditEntry, AuditEntry};

/// Column list for `audit_log` queries.
const COLUMNS: &str = "id, zone_id, action, actor_id, recorded_at, before_data, after_data";

/// Append and query operations for the audit ledger.
///
/// Append-only by construction: this repository exposes no update and no
/// delete, and quota state is always re-derived by counting entries rather
/// than stored anywhere.
pub struct AuditRepo;

impl AuditRepo {
    /// Append one ledger entry.
    ///
    /// Called inside the mutation's transaction so the entry commits
    /// atomically with the row change it describes.
    pub async fn append(
        executor: impl PgExecutor<'_>,
        entry: &AppendAuditEntry,
    ) -> Result<AuditEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_log (zone_id, action, actor_id, recorded_at, before_data, after_data) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(entry.zone_id)
            .bind(entry.action.as_str())
            .bind(&entry.actor_id)
            .bind(entry.recorded_at)
            .bind(&entry.before_data)
            .bind(&entry.after_data)
            .fetch_one(executor)
            .await
    }

    /// Full history for one zone, oldest first.
    pub async fn history_for_zone(
        executor: impl PgExecutor<'_>,
        zone_id: DbId,
    ) -> Result<Vec<AuditEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_log WHERE zone_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(zone_id)
            .fetch_all(executor)
            .await
    }

    /// The most recent entry for one zone, or `None` if it has no history.
    ///
    /// Grace-delete eligibility reads this: the zone's last entry must be
    /// its CREATE, by the deleting actor, still inside the grace window.
    pub async fn last_entry_for_zone(
        executor: impl PgExecutor<'_>,
        zone_id: DbId,
    ) -> Result<Option<AuditEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM audit_log WHERE zone_id = $1 ORDER BY id DESC LIMIT 1");
        sqlx::query_as::<_, AuditEntry>(&query)
            .bind(zone_id)
            .fetch_optional(executor)
            .await
    }

    /// Per-action entry counts for one actor within `[day_start, day_end)`.
    pub async fn ledger_counts(
        executor: impl PgExecutor<'_>,
        actor: &str,
        day_start: Timestamp,
        day_end: Timestamp,
    ) -> Result<LedgerCounts, sqlx::Error> {
        let query = format!(
            "SELECT \
                COUNT(*) FILTER (WHERE action = '{create}') AS creates, \
                COUNT(*) FILTER (WHERE action = '{update}') AS updates, \
                COUNT(*) FILTER (WHERE action = '{delete}') AS deletes, \
                COUNT(*) FILTER (WHERE action = '{grace_delete}') AS grace_deletes \
             FROM audit_log \
             WHERE actor_id = $1 AND recorded_at >= $2 AND recorded_at < $3",
            create = actions::CREATE,
            update = actions::UPDATE,
            delete = actions::DELETE,
            grace_delete = actions::GRACE_DELETE,
        );
        let (creates, updates, deletes, grace_deletes) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(&query)
                .bind(actor)
                .bind(day_start)
                .bind(day_end)
                .fetch_one(executor)
                .await?;
        Ok(LedgerCounts {
            creates,
            updates,
            deletes,
            grace_deletes,
        })
    }
}
