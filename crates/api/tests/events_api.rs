//! Tests for event publication on the in-process bus.
//!
//! Every successful mutation must publish exactly one event, strictly after
//! its transaction committed; refused mutations must publish nothing.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app_with_bus, delete_as, post_empty, post_json, put_json, zone_body,
};
use sqlx::PgPool;
use tokio::sync::broadcast::error::TryRecvError;
use zonal_events::kinds;

// ---------------------------------------------------------------------------
// Test: a successful create publishes exactly one zone.created
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_publishes_single_event(pool: PgPool) {
    let (app, bus) = build_test_app_with_bus(pool);
    let mut rx = bus.subscribe();

    let response = post_json(app, "/api/v1/zones", "alice", zone_body(0.0)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let zone_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let event = rx.recv().await.expect("create should publish an event");
    assert_eq!(event.event_type, kinds::ZONE_CREATED);
    assert_eq!(event.zone_id, Some(zone_id));
    assert_eq!(event.actor.as_deref(), Some("alice"));

    assert!(
        matches!(rx.try_recv(), Err(TryRecvError::Empty)),
        "exactly one event per mutation"
    );
}

// ---------------------------------------------------------------------------
// Test: a refused create publishes nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refused_create_publishes_nothing(pool: PgPool) {
    let (app, bus) = build_test_app_with_bus(pool);

    let response = post_json(app.clone(), "/api/v1/zones", "alice", zone_body(0.0)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Subscribe after the first create so only the refusal is observed.
    let mut rx = bus.subscribe();

    let response = post_json(app, "/api/v1/zones", "bob", zone_body(0.5)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(
        matches!(rx.try_recv(), Err(TryRecvError::Empty)),
        "a refused mutation must not publish"
    );
}

// ---------------------------------------------------------------------------
// Test: the full lifecycle publishes one event per mutation, in order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lifecycle_event_sequence(pool: PgPool) {
    let (app, bus) = build_test_app_with_bus(pool);
    let mut rx = bus.subscribe();

    let response = post_json(app.clone(), "/api/v1/zones", "alice", zone_body(0.0)).await;
    let zone_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(
        app.clone(),
        &format!("/api/v1/zones/{zone_id}/checkout"),
        "alice",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json(
        app.clone(),
        &format!("/api/v1/zones/{zone_id}"),
        "alice",
        serde_json::json!({ "description": "edited" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The update already ended the lease, so this release is a no-op and
    // must not publish.
    let response = post_empty(
        app.clone(),
        &format!("/api/v1/zones/{zone_id}/release"),
        "alice",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_as(app, &format!("/api/v1/zones/{zone_id}"), "alice").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type);
    }
    assert_eq!(
        types,
        vec![
            kinds::ZONE_CREATED,
            kinds::ZONE_LOCKED,
            kinds::ZONE_UPDATED,
            kinds::ZONE_DELETED,
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: a real release publishes zone.released
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_of_live_lease_publishes(pool: PgPool) {
    let (app, bus) = build_test_app_with_bus(pool);

    let response = post_json(app.clone(), "/api/v1/zones", "alice", zone_body(0.0)).await;
    let zone_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(
        app.clone(),
        &format!("/api/v1/zones/{zone_id}/checkout"),
        "alice",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut rx = bus.subscribe();

    let response = post_empty(app, &format!("/api/v1/zones/{zone_id}/release"), "alice").await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = rx.recv().await.expect("release should publish");
    assert_eq!(event.event_type, kinds::ZONE_RELEASED);
    assert_eq!(event.zone_id, Some(zone_id));
}
