//! Edit lease constants, classification, and holder verification.
//!
//! This module lives in `core` (zero internal deps) so the repository layer
//! and the HTTP handlers apply the same lease duration and the same
//! live/expired classification rules.
//!
//! Expired leases are reaped lazily: nothing in the data model distinguishes
//! "expired" from "free" except a comparison against `now`, so every decision
//! point classifies first. The background sweeper only tidies rows, it is
//! never needed for correctness.

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Lease duration constants
// ---------------------------------------------------------------------------

/// How long a checkout holds a zone, in minutes.
pub const LEASE_DURATION_MINS: i64 = 15;

/// How often the expired-lease sweeper runs (in seconds).
pub const LEASE_SWEEP_INTERVAL_SECS: u64 = 60;

/// Compute the expiry for a lease granted (or renewed) at `now`.
pub fn lease_expiry(now: Timestamp) -> Timestamp {
    now + chrono::Duration::minutes(LEASE_DURATION_MINS)
}

// ---------------------------------------------------------------------------
// Lease state classification
// ---------------------------------------------------------------------------

/// Lease state of a zone at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseState {
    /// No lease recorded, or a previously recorded lease already expired.
    Free,
    /// A live lease held by `holder` until `expires_at`.
    Held { holder: String, expires_at: Timestamp },
}

impl LeaseState {
    /// Classify raw lock columns at instant `now`.
    ///
    /// A lease is live only while `lock_expires_at > now`; at the exact
    /// expiry instant it is already free.
    pub fn classify(
        locked_by: Option<&str>,
        lock_expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        match (locked_by, lock_expires_at) {
            (Some(holder), Some(expires_at)) if expires_at > now => Self::Held {
                holder: holder.to_string(),
                expires_at,
            },
            _ => Self::Free,
        }
    }
}

// ---------------------------------------------------------------------------
// Holder verification (update path)
// ---------------------------------------------------------------------------

/// Check that `actor` holds a live lease on the zone.
///
/// `LockMismatch` when another user holds a live lease; `LockExpired` when no
/// live lease exists at all, whether it was never acquired or lapsed mid-edit.
pub fn verify_holder(
    zone_id: DbId,
    locked_by: Option<&str>,
    lock_expires_at: Option<Timestamp>,
    actor: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    match LeaseState::classify(locked_by, lock_expires_at, now) {
        LeaseState::Held { holder, .. } if holder == actor => Ok(()),
        LeaseState::Held { holder, .. } => Err(CoreError::LockMismatch { zone_id, holder }),
        LeaseState::Free => Err(CoreError::LockExpired { zone_id }),
    }
}

// ---------------------------------------------------------------------------
// Release classification
// ---------------------------------------------------------------------------

/// Outcome of a release request against the current lease state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    /// Actor holds the live lease: clear both lock columns.
    Clear,
    /// No live lease exists: releasing is an idempotent no-op.
    Noop,
}

/// Classify a release request.
///
/// Releasing a free or expired lease succeeds without touching the row;
/// releasing another user's live lease is refused.
pub fn classify_release(
    zone_id: DbId,
    locked_by: Option<&str>,
    lock_expires_at: Option<Timestamp>,
    actor: &str,
    now: Timestamp,
) -> Result<ReleaseAction, CoreError> {
    match LeaseState::classify(locked_by, lock_expires_at, now) {
        LeaseState::Held { holder, .. } if holder == actor => Ok(ReleaseAction::Clear),
        LeaseState::Held { holder, .. } => Err(CoreError::LockMismatch { zone_id, holder }),
        LeaseState::Free => Ok(ReleaseAction::Noop),
    }
}

// ---------------------------------------------------------------------------
// Public lock status
// ---------------------------------------------------------------------------

/// Publicly visible lock fields: `(locked_by, lock_expires_at)`.
///
/// Both are `None` unless a live lease exists, so clients never see stale
/// holders that the sweeper has not cleaned up yet.
pub fn public_lock_fields(
    locked_by: Option<&str>,
    lock_expires_at: Option<Timestamp>,
    now: Timestamp,
) -> (Option<String>, Option<Timestamp>) {
    match LeaseState::classify(locked_by, lock_expires_at, now) {
        LeaseState::Held { holder, expires_at } => (Some(holder), Some(expires_at)),
        LeaseState::Free => (None, None),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
