//! Zone lifecycle orchestration: the transactional write paths.
//!
//! Every mutation runs as a single transaction with a fixed gate order, and
//! appends its audit entry inside that transaction. A committed row change
//! therefore always has its ledger entry, and a refused gate leaves no
//! partial state behind.
//!
//! Lock ordering is fixed to stay deadlock-free: mutations on an existing
//! zone take the row lock (`FOR UPDATE`) first and the per-actor quota
//! advisory lock second. Create takes only the advisory lock.

use chrono::NaiveDate;
use chrono_tz::Tz;
use geo::MultiPolygon;
use sqlx::PgConnection;

use zonal_core::audit::AuditAction;
use zonal_core::error::CoreError;
use zonal_core::geometry;
use zonal_core::lease::{self, LeaseState, ReleaseAction};
use zonal_core::quota::{self, QuotaAction, QuotaUsage, QUOTA_LOCK_NAMESPACE};
use zonal_core::types::{DbId, Timestamp};

use crate::error::DbError;
use crate::models::audit::AppendAuditEntry;
use crate::models::zone::{CreateZone, UpdateZone, Zone};
use crate::repositories::{AuditRepo, CategoryRepo, LockRepo, ZoneRepo};
use crate::DbPool;

/// How many times checkout re-runs its guarded UPDATE when the follow-up
/// read finds the lock free again.
const CHECKOUT_ATTEMPTS: usize = 3;

/// Result of a delete: the tombstoned zone and the ledger action recorded
/// for it (`Delete`, or `GraceDelete` when a fresh create was undone by its
/// own author).
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    pub zone: Zone,
    pub action: AuditAction,
}

/// Orchestrates zone mutations across repositories.
///
/// All methods take `now` from the caller rather than reading the clock, so
/// tests can pin time and the HTTP layer stamps one instant per request.
pub struct ZoneLifecycle;

impl ZoneLifecycle {
    /// Create a zone.
    ///
    /// Gate order: create quota, category resolution, geometry structure,
    /// overlap conflict. The new row and its CREATE entry commit together.
    pub async fn create(
        pool: &DbPool,
        actor: &str,
        input: &CreateZone,
        tz: Tz,
        now: Timestamp,
    ) -> Result<Zone, DbError> {
        let mut tx = pool.begin().await?;

        let usage = Self::locked_usage(&mut *tx, actor, tz, now).await?;
        usage.check(QuotaAction::Create)?;

        let category = CategoryRepo::find_by_code(&mut *tx, &input.category)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("Unknown category code: '{}'", input.category))
            })?;

        let candidate = geometry::validate_structure(&input.geometry)?;
        let others = ZoneRepo::active_geometries(&mut *tx, None).await?;
        Self::check_conflicts(&candidate, &others)?;

        let zone = ZoneRepo::insert(
            &mut *tx,
            &input.geometry,
            category.id,
            input.description.as_deref(),
            actor,
            now,
        )
        .await?;

        AuditRepo::append(
            &mut *tx,
            &AppendAuditEntry {
                zone_id: zone.id,
                action: AuditAction::Create,
                actor_id: actor.to_string(),
                recorded_at: now,
                before_data: None,
                after_data: Some(Self::snapshot(&zone)),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(zone)
    }

    /// Update a zone the actor holds a live lease on.
    ///
    /// Gate order: existence, lease, then category and geometry for the
    /// fields the patch actually carries, then update quota. A successful
    /// update consumes one update credit, ends the lease, and commits the
    /// row change with its UPDATE entry.
    pub async fn update(
        pool: &DbPool,
        id: DbId,
        actor: &str,
        patch: &UpdateZone,
        tz: Tz,
        now: Timestamp,
    ) -> Result<Zone, DbError> {
        if patch.is_empty() {
            return Err(
                CoreError::Validation("update must change at least one field".to_string()).into(),
            );
        }

        let mut tx = pool.begin().await?;

        let zone = ZoneRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "zone", id })?;

        lease::verify_holder(
            id,
            zone.locked_by.as_deref(),
            zone.lock_expires_at,
            actor,
            now,
        )?;

        let category_id = match &patch.category {
            Some(code) => Some(
                CategoryRepo::find_by_code(&mut *tx, code)
                    .await?
                    .ok_or_else(|| {
                        CoreError::Validation(format!("Unknown category code: '{code}'"))
                    })?
                    .id,
            ),
            None => None,
        };

        if let Some(geometry_value) = &patch.geometry {
            let candidate = geometry::validate_structure(geometry_value)?;
            let others = ZoneRepo::active_geometries(&mut *tx, Some(id)).await?;
            Self::check_conflicts(&candidate, &others)?;
        }

        let usage = Self::locked_usage(&mut *tx, actor, tz, now).await?;
        usage.check(QuotaAction::Update)?;

        let before = Self::snapshot(&zone);
        let updated = ZoneRepo::apply_update(
            &mut *tx,
            id,
            patch.geometry.as_ref(),
            category_id,
            patch.description.as_deref(),
            actor,
            now,
        )
        .await?;

        AuditRepo::append(
            &mut *tx,
            &AppendAuditEntry {
                zone_id: id,
                action: AuditAction::Update,
                actor_id: actor.to_string(),
                recorded_at: now,
                before_data: Some(before),
                after_data: Some(Self::snapshot(&updated)),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Soft-delete a zone.
    ///
    /// When the zone's last ledger entry is its CREATE, by this actor, still
    /// inside the grace window, the ledger records GRACE_DELETE: the create
    /// credit comes back and no delete credit is spent. Every other delete
    /// consumes one delete credit. Deletion does not require a lease.
    pub async fn delete(
        pool: &DbPool,
        id: DbId,
        actor: &str,
        tz: Tz,
        now: Timestamp,
    ) -> Result<DeletionOutcome, DbError> {
        let mut tx = pool.begin().await?;

        let zone = ZoneRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "zone", id })?;

        // Advisory lock even on the grace path: the GRACE_DELETE append
        // must serialize with the actor's other quota counting.
        let usage = Self::locked_usage(&mut *tx, actor, tz, now).await?;

        let last = AuditRepo::last_entry_for_zone(&mut *tx, id).await?;
        let is_grace = last.as_ref().is_some_and(|entry| {
            entry.action == AuditAction::Create.as_str()
                && entry.actor_id == actor
                && quota::within_grace_window(entry.recorded_at, now)
        });

        let action = if is_grace {
            AuditAction::GraceDelete
        } else {
            usage.check(QuotaAction::Delete)?;
            AuditAction::Delete
        };

        let before = Self::snapshot(&zone);
        let deleted = ZoneRepo::soft_delete(&mut *tx, id, actor, now).await?;

        AuditRepo::append(
            &mut *tx,
            &AppendAuditEntry {
                zone_id: id,
                action,
                actor_id: actor.to_string(),
                recorded_at: now,
                before_data: Some(before),
                after_data: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(DeletionOutcome {
            zone: deleted,
            action,
        })
    }

    /// Acquire or renew the edit lease on a zone.
    ///
    /// One guarded UPDATE does the whole transition; when it matches nothing
    /// the row is read back to name the reason. A read-back that finds the
    /// lock free means the holder released between the two statements, and
    /// the UPDATE runs again: a zone observed free must end up checked out,
    /// not refused.
    pub async fn checkout(
        pool: &DbPool,
        id: DbId,
        actor: &str,
        now: Timestamp,
    ) -> Result<Zone, DbError> {
        let expires_at = lease::lease_expiry(now);
        for _ in 0..CHECKOUT_ATTEMPTS {
            if let Some(zone) = LockRepo::checkout(pool, id, actor, expires_at, now).await? {
                return Ok(zone);
            }

            let zone = ZoneRepo::find_by_id(pool, id)
                .await?
                .ok_or(CoreError::NotFound { entity: "zone", id })?;
            match LeaseState::classify(zone.locked_by.as_deref(), zone.lock_expires_at, now) {
                LeaseState::Held { holder, expires_at } => {
                    return Err(CoreError::AlreadyLocked {
                        zone_id: id,
                        holder,
                        expires_at,
                    }
                    .into())
                }
                // Released between the two statements; take another pass.
                LeaseState::Free => {}
            }
        }
        Err(CoreError::Internal(format!("checkout of zone {id} did not settle")).into())
    }

    /// Release the edit lease on a zone.
    ///
    /// Idempotent: releasing a free or already-expired lease succeeds as a
    /// no-op. Only a live lease held by someone else is refused.
    pub async fn release(
        pool: &DbPool,
        id: DbId,
        actor: &str,
        now: Timestamp,
    ) -> Result<ReleaseAction, DbError> {
        let mut tx = pool.begin().await?;

        let zone = ZoneRepo::find_for_update(&mut *tx, id)
            .await?
            .ok_or(CoreError::NotFound { entity: "zone", id })?;

        let action = lease::classify_release(
            id,
            zone.locked_by.as_deref(),
            zone.lock_expires_at,
            actor,
            now,
        )?;
        if action == ReleaseAction::Clear {
            LockRepo::clear(&mut *tx, id).await?;
        }

        tx.commit().await?;
        Ok(action)
    }

    /// Derive the actor's current usage without taking any lock.
    ///
    /// Read-only path for the quota endpoint; mutations always re-derive
    /// under the advisory lock instead of trusting this.
    pub async fn usage_for(
        pool: &DbPool,
        actor: &str,
        tz: Tz,
        now: Timestamp,
    ) -> Result<QuotaUsage, DbError> {
        Self::usage_on(pool, actor, quota::quota_day(now, tz), tz).await
    }

    /// Derive the actor's usage for one explicit quota day.
    pub async fn usage_on(
        pool: &DbPool,
        actor: &str,
        day: NaiveDate,
        tz: Tz,
    ) -> Result<QuotaUsage, DbError> {
        let (day_start, day_end) = quota::day_bounds_for_date(day, tz);
        let counts = AuditRepo::ledger_counts(pool, actor, day_start, day_end).await?;
        Ok(QuotaUsage::derive(counts))
    }

    // ── Internals ──────────────────────────────────────────────────────────

    /// Take the per-actor advisory lock, then derive usage for the actor's
    /// current quota day.
    ///
    /// `pg_advisory_xact_lock` holds until commit or rollback, so the count
    /// and the later ledger append are serialized per actor. Two concurrent
    /// mutations by one actor cannot both pass a check at one remaining
    /// credit.
    async fn locked_usage(
        conn: &mut PgConnection,
        actor: &str,
        tz: Tz,
        now: Timestamp,
    ) -> Result<QuotaUsage, DbError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(QUOTA_LOCK_NAMESPACE)
            .bind(actor)
            .execute(&mut *conn)
            .await?;
        let (day_start, day_end) = quota::day_bounds(now, tz);
        let counts = AuditRepo::ledger_counts(&mut *conn, actor, day_start, day_end).await?;
        Ok(QuotaUsage::derive(counts))
    }

    /// Run overlap detection against the stored geometries.
    ///
    /// A stored geometry that no longer parses is skipped with a warning
    /// rather than blocking every write in the system.
    fn check_conflicts(
        candidate: &MultiPolygon<f64>,
        others: &[(DbId, serde_json::Value)],
    ) -> Result<(), CoreError> {
        let mut parsed = Vec::with_capacity(others.len());
        for (zone_id, value) in others {
            match geometry::parse_stored(value) {
                Some(multi) => parsed.push((*zone_id, multi)),
                None => tracing::warn!(zone_id, "skipping unparseable stored geometry"),
            }
        }
        geometry::find_conflict(candidate, parsed.iter().map(|(id, multi)| (*id, multi)))
    }

    /// The `{geometry, category_id, description}` snapshot stored in ledger
    /// entries.
    fn snapshot(zone: &Zone) -> serde_json::Value {
        serde_json::json!({
            "geometry": zone.geometry,
            "category_id": zone.category_id,
            "description": zone.description,
        })
    }
}
