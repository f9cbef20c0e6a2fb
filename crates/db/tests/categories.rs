//! Integration tests for the zone category reference table.

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::json;
use sqlx::PgPool;
use zonal_core::types::Timestamp;
use zonal_db::lifecycle::ZoneLifecycle;
use zonal_db::models::category::CreateZoneCategory;
use zonal_db::models::zone::CreateZone;
use zonal_db::repositories::CategoryRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TZ: Tz = chrono_tz::UTC;

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

fn new_category(code: &str) -> CreateZoneCategory {
    CreateZoneCategory {
        code: code.to_string(),
        name: "Test category".to_string(),
        color_hex: "#336699".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Test: seeded defaults are present and ordered by code
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_defaults_present(pool: PgPool) {
    let categories = CategoryRepo::list(&pool).await.unwrap();
    let codes: Vec<&str> = categories.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["alert_standard", "no_alert"]);
}

// ---------------------------------------------------------------------------
// Test: create then find by code
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find_by_code(pool: PgPool) {
    let created = CategoryRepo::create(&pool, &new_category("wildlife_refuge"), t0())
        .await
        .unwrap();
    assert_eq!(created.color_hex, "#336699");

    let found = CategoryRepo::find_by_code(&pool, "wildlife_refuge")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);

    assert!(CategoryRepo::find_by_code(&pool, "absent")
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: duplicate code violates the unique constraint
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_code_refused(pool: PgPool) {
    CategoryRepo::create(&pool, &new_category("dup"), t0())
        .await
        .unwrap();
    let err = CategoryRepo::create(&pool, &new_category("dup"), t0())
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}

// ---------------------------------------------------------------------------
// Test: an unreferenced category can be deleted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_unreferenced_category(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("ephemeral"), t0())
        .await
        .unwrap();

    let deleted = CategoryRepo::delete_unreferenced(&pool, category.id)
        .await
        .unwrap();
    assert!(deleted);
    assert!(CategoryRepo::find_by_id(&pool, category.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: a category referenced by any zone row is undeletable
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_referenced_category_is_undeletable(pool: PgPool) {
    let category = CategoryRepo::create(&pool, &new_category("sticky"), t0())
        .await
        .unwrap();
    let zone = ZoneLifecycle::create(
        &pool,
        "alice",
        &CreateZone {
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[
                    [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
                ]]
            }),
            category: "sticky".to_string(),
            description: None,
        },
        TZ,
        t0(),
    )
    .await
    .unwrap();

    let deleted = CategoryRepo::delete_unreferenced(&pool, category.id)
        .await
        .unwrap();
    assert!(!deleted, "live zone reference must block deletion");

    // Tombstoned zones keep their reference, so deletion stays blocked.
    ZoneLifecycle::delete(&pool, zone.id, "alice", TZ, t0()).await.unwrap();
    let deleted = CategoryRepo::delete_unreferenced(&pool, category.id)
        .await
        .unwrap();
    assert!(!deleted, "tombstoned zone reference must block deletion");
}
