//! Integration tests for edit lease checkout, release, and sweeping.
//!
//! Leases are lazy-expiring: the columns stay stale until a write path or
//! the sweeper touches them, and every decision re-derives liveness against
//! the caller's `now`. These tests drive checkout and release through the
//! lifecycle layer against a real database, including a genuinely concurrent
//! double checkout.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::json;
use sqlx::PgPool;
use zonal_core::error::CoreError;
use zonal_core::lease::{ReleaseAction, LEASE_DURATION_MINS};
use zonal_core::types::Timestamp;
use zonal_db::lifecycle::ZoneLifecycle;
use zonal_db::models::zone::CreateZone;
use zonal_db::repositories::{LockRepo, ZoneRepo};
use zonal_db::DbError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TZ: Tz = chrono_tz::UTC;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn square(min_x: f64) -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, 0.0],
            [min_x + 1.0, 0.0],
            [min_x + 1.0, 1.0],
            [min_x, 1.0],
            [min_x, 0.0],
        ]]
    })
}

async fn seeded_zone(pool: &PgPool) -> i64 {
    let input = CreateZone {
        geometry: square(0.0),
        category: "no_alert".to_string(),
        description: None,
    };
    ZoneLifecycle::create(pool, "owner", &input, TZ, t0())
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Test: checkout grants a lease for the full duration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_checkout_grants_full_duration(pool: PgPool) {
    let id = seeded_zone(&pool).await;

    let zone = ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();
    assert_eq!(zone.locked_by.as_deref(), Some("alice"));
    assert_eq!(
        zone.lock_expires_at.unwrap(),
        t0() + Duration::minutes(LEASE_DURATION_MINS)
    );
}

// ---------------------------------------------------------------------------
// Test: a live lease blocks other users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_live_lease_blocks_second_user(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    let err = ZoneLifecycle::checkout(&pool, id, "bob", t0() + Duration::minutes(5))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        DbError::Core(CoreError::AlreadyLocked { holder, expires_at, .. }) => {
            assert_eq!(holder, "alice");
            assert_eq!(expires_at, t0() + Duration::minutes(LEASE_DURATION_MINS));
        }
    );
}

// ---------------------------------------------------------------------------
// Test: concurrent checkouts grant exactly one lease
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_checkouts_grant_one_lease(pool: PgPool) {
    let id = seeded_zone(&pool).await;

    let (a, b) = tokio::join!(
        ZoneLifecycle::checkout(&pool, id, "alice", t0()),
        ZoneLifecycle::checkout(&pool, id, "bob", t0()),
    );

    assert_eq!(
        a.is_ok() as u8 + b.is_ok() as u8,
        1,
        "exactly one of two concurrent checkouts may win"
    );
    let winner = ZoneRepo::find_by_id(&pool, id)
        .await
        .unwrap()
        .unwrap()
        .locked_by
        .unwrap();
    assert!(winner == "alice" || winner == "bob");

    // The loser learns who holds the lease, never some other refusal.
    let loser_err = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert_matches!(
        loser_err,
        DbError::Core(CoreError::AlreadyLocked { holder, .. }) if holder == winner
    );
}

// ---------------------------------------------------------------------------
// Test: the holder can renew before expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_holder_renews_own_lease(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    // 10 minutes in, a renewal restarts the clock from now.
    let renewed_at = t0() + Duration::minutes(10);
    let zone = ZoneLifecycle::checkout(&pool, id, "alice", renewed_at)
        .await
        .unwrap();
    assert_eq!(
        zone.lock_expires_at.unwrap(),
        renewed_at + Duration::minutes(LEASE_DURATION_MINS)
    );
}

// ---------------------------------------------------------------------------
// Test: an expired lease is free for the next user
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_lease_is_free_for_next_user(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    // No sweeper has run; the stale columns alone must not block bob.
    let after_expiry = t0() + Duration::minutes(LEASE_DURATION_MINS + 1);
    let zone = ZoneLifecycle::checkout(&pool, id, "bob", after_expiry)
        .await
        .unwrap();
    assert_eq!(zone.locked_by.as_deref(), Some("bob"));
}

// ---------------------------------------------------------------------------
// Test: checkout of a missing or deleted zone is NotFound
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_checkout_missing_zone_not_found(pool: PgPool) {
    let err = ZoneLifecycle::checkout(&pool, 4242, "alice", t0())
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_checkout_deleted_zone_not_found(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::delete(&pool, id, "owner", TZ, t0()).await.unwrap();

    let err = ZoneLifecycle::checkout(&pool, id, "alice", t0())
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Core(CoreError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Test: release clears own lease and is idempotent
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_clears_then_noops(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    let first = ZoneLifecycle::release(&pool, id, "alice", t0() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(first, ReleaseAction::Clear);

    let zone = ZoneRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert!(zone.locked_by.is_none());
    assert!(zone.lock_expires_at.is_none());

    let second = ZoneLifecycle::release(&pool, id, "alice", t0() + Duration::minutes(2))
        .await
        .unwrap();
    assert_eq!(second, ReleaseAction::Noop);
}

// ---------------------------------------------------------------------------
// Test: releasing an expired lease is a no-op, not an error
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_expired_lease_noops(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    let action = ZoneLifecycle::release(
        &pool,
        id,
        "alice",
        t0() + Duration::minutes(LEASE_DURATION_MINS + 5),
    )
    .await
    .unwrap();
    assert_eq!(action, ReleaseAction::Noop);
}

// ---------------------------------------------------------------------------
// Test: releasing someone else's live lease is refused
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_other_live_lease_refused(pool: PgPool) {
    let id = seeded_zone(&pool).await;
    ZoneLifecycle::checkout(&pool, id, "alice", t0()).await.unwrap();

    let err = ZoneLifecycle::release(&pool, id, "bob", t0() + Duration::minutes(1))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        DbError::Core(CoreError::LockMismatch { holder, .. }) if holder == "alice"
    );

    // Alice's lease survives the refused release.
    let zone = ZoneRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(zone.locked_by.as_deref(), Some("alice"));
}

// ---------------------------------------------------------------------------
// Test: the sweeper clears only expired rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_clears_only_expired_rows(pool: PgPool) {
    let first = seeded_zone(&pool).await;
    let second = {
        let input = CreateZone {
            geometry: square(5.0),
            category: "no_alert".to_string(),
            description: None,
        };
        ZoneLifecycle::create(&pool, "owner", &input, TZ, t0())
            .await
            .unwrap()
            .id
    };

    ZoneLifecycle::checkout(&pool, first, "alice", t0()).await.unwrap();
    // Second lease starts 10 minutes later and is still live at sweep time.
    ZoneLifecycle::checkout(&pool, second, "bob", t0() + Duration::minutes(10))
        .await
        .unwrap();

    let swept = LockRepo::sweep_expired(&pool, t0() + Duration::minutes(16))
        .await
        .unwrap();
    assert_eq!(swept, 1, "only alice's lapsed lease should be swept");

    let kept = ZoneRepo::find_by_id(&pool, second).await.unwrap().unwrap();
    assert_eq!(kept.locked_by.as_deref(), Some("bob"));
    let cleared = ZoneRepo::find_by_id(&pool, first).await.unwrap().unwrap();
    assert!(cleared.locked_by.is_none());
}
