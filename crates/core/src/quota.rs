//! Daily quota limits and usage derivation.
//!
//! Quotas are never stored as counters. Usage is derived on demand by
//! replaying the audit ledger for the actor's current quota day, so the
//! ledger stays the single source of truth and a refunded create credit
//! (grace delete) is just arithmetic over entry counts.
//!
//! The quota day is a calendar day in one fixed, configured timezone,
//! converted here to a half-open UTC interval for ledger counting. The
//! 120-minute grace window is pure wall-clock time and ignores day
//! boundaries entirely.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum zone creations per actor per quota day.
pub const DAILY_CREATE_LIMIT: i64 = 15;

/// Maximum zone updates per actor per quota day.
pub const DAILY_UPDATE_LIMIT: i64 = 5;

/// Maximum zone deletions per actor per quota day.
pub const DAILY_DELETE_LIMIT: i64 = 5;

/// Minutes after creation during which the creator's delete refunds the
/// create credit instead of consuming a delete credit.
pub const GRACE_PERIOD_MINS: i64 = 120;

// ---------------------------------------------------------------------------
// Advisory lock namespace
// ---------------------------------------------------------------------------

/// PostgreSQL advisory lock namespace for per-actor quota serialization.
///
/// Taken as `pg_advisory_xact_lock(QUOTA_LOCK_NAMESPACE, hashtext(actor))`
/// before counting, so two concurrent mutations by the same actor cannot
/// both pass the check at one remaining credit.
pub const QUOTA_LOCK_NAMESPACE: i32 = 740_215_883;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Quota-limited mutation kinds.
///
/// Grace deletes are deliberately absent: they consume nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaAction {
    Create,
    Update,
    Delete,
}

impl QuotaAction {
    /// The daily limit for this action.
    pub fn limit(self) -> i64 {
        match self {
            Self::Create => DAILY_CREATE_LIMIT,
            Self::Update => DAILY_UPDATE_LIMIT,
            Self::Delete => DAILY_DELETE_LIMIT,
        }
    }

    /// Lowercase label used in messages and response payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Usage derivation
// ---------------------------------------------------------------------------

/// Raw ledger entry counts for one actor within one quota day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub creates: i64,
    pub updates: i64,
    pub deletes: i64,
    pub grace_deletes: i64,
}

/// Derived usage for a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionUsage {
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
}

impl ActionUsage {
    fn new(used: i64, limit: i64) -> Self {
        Self {
            used,
            limit,
            remaining: (limit - used).max(0),
        }
    }
}

/// Full per-action usage breakdown for one actor and one quota day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub create: ActionUsage,
    pub update: ActionUsage,
    pub delete: ActionUsage,
}

impl QuotaUsage {
    /// Derive usage from raw ledger counts.
    ///
    /// Each grace delete refunds one create credit, floored at zero so a
    /// ledger with more grace deletes than creates (possible across day
    /// boundaries) never yields negative usage.
    pub fn derive(counts: LedgerCounts) -> Self {
        Self {
            create: ActionUsage::new(
                (counts.creates - counts.grace_deletes).max(0),
                DAILY_CREATE_LIMIT,
            ),
            update: ActionUsage::new(counts.updates, DAILY_UPDATE_LIMIT),
            delete: ActionUsage::new(counts.deletes, DAILY_DELETE_LIMIT),
        }
    }

    /// The usage slice for one action.
    pub fn for_action(&self, action: QuotaAction) -> ActionUsage {
        match action {
            QuotaAction::Create => self.create,
            QuotaAction::Update => self.update,
            QuotaAction::Delete => self.delete,
        }
    }

    /// Refuse the action when no credit remains.
    ///
    /// The error carries the whole breakdown so the response can show the
    /// caller what they have left on every action, not just the failing one.
    pub fn check(&self, action: QuotaAction) -> Result<(), CoreError> {
        let usage = self.for_action(action);
        if usage.remaining <= 0 {
            return Err(CoreError::QuotaExceeded {
                action,
                used: usage.used,
                limit: usage.limit,
                usage: *self,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Quota day boundaries
// ---------------------------------------------------------------------------

/// The quota day an instant belongs to, in the reference timezone.
pub fn quota_day(now: Timestamp, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Half-open UTC interval `[start, end)` of the quota day containing `now`.
pub fn day_bounds(now: Timestamp, tz: Tz) -> (Timestamp, Timestamp) {
    day_bounds_for_date(quota_day(now, tz), tz)
}

/// Half-open UTC interval `[start, end)` of one calendar day in `tz`.
pub fn day_bounds_for_date(date: NaiveDate, tz: Tz) -> (Timestamp, Timestamp) {
    (
        day_start_utc(date, tz),
        day_start_utc(date + chrono::Days::new(1), tz),
    )
}

fn day_start_utc(date: NaiveDate, tz: Tz) -> Timestamp {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight erased by a DST gap: the day starts when clocks resume.
        chrono::LocalResult::None => tz
            .from_local_datetime(&(midnight + chrono::Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

// ---------------------------------------------------------------------------
// Grace window
// ---------------------------------------------------------------------------

/// Whether `now` falls inside the grace window opened at `created_at`.
///
/// Wall-clock arithmetic, boundary inclusive. A zone created at 23:00 and
/// deleted at 00:30 the next day is still inside its window.
pub fn within_grace_window(created_at: Timestamp, now: Timestamp) -> bool {
    let elapsed = now.signed_duration_since(created_at);
    elapsed >= chrono::Duration::zero() && elapsed <= chrono::Duration::minutes(GRACE_PERIOD_MINS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
