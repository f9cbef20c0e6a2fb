//! Shared helpers for HTTP-level integration tests.
//!
//! Requests go through the full middleware stack via `build_app_router`, so
//! tests exercise exactly what production serves. Identity is injected the
//! same way the fronting gateway does it, through `x-user-id` and
//! `x-user-role` headers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use zonal_api::config::ServerConfig;
use zonal_api::router::build_app_router;
use zonal_api::state::AppState;
use zonal_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and UTC as the quota timezone.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        lock_sweep_interval_secs: 60,
        quota_timezone: chrono_tz::UTC,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool).0
}

/// Like [`build_test_app`], but also hands back the event bus so tests can
/// subscribe and assert on published events.
pub fn build_test_app_with_bus(pool: PgPool) -> (Router, Arc<EventBus>) {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };

    (build_app_router(state, &config), event_bus)
}

/// Send one request through the router and return the raw response.
async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user: Option<(&str, &str)>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = user {
        builder = builder.header("x-user-id", user_id).header("x-user-role", role);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.oneshot(request).await.unwrap()
}

/// GET without identity headers.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

/// GET as a regular user.
pub async fn get_as(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some((user, "user")), None).await
}

/// POST a JSON body as a regular user.
pub async fn post_json(
    app: Router,
    uri: &str,
    user: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some((user, "user")), Some(body)).await
}

/// POST with an empty body as a regular user (checkout, release).
pub async fn post_empty(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some((user, "user")), None).await
}

/// PUT a JSON body as a regular user.
pub async fn put_json(
    app: Router,
    uri: &str,
    user: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some((user, "user")), Some(body)).await
}

/// DELETE as a regular user.
pub async fn delete_as(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some((user, "user")), None).await
}

/// POST a JSON body with the `admin` role.
pub async fn admin_post_json(
    app: Router,
    uri: &str,
    user: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some((user, "admin")), Some(body)).await
}

/// DELETE with the `admin` role.
pub async fn admin_delete(app: Router, uri: &str, user: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some((user, "admin")), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A square polygon with corners `(min_x, min_y)` and `(min_x+1, min_y+1)`,
/// as a GeoJSON value.
pub fn square(min_x: f64, min_y: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y],
            [min_x + 1.0, min_y],
            [min_x + 1.0, min_y + 1.0],
            [min_x, min_y + 1.0],
            [min_x, min_y],
        ]]
    })
}

/// Request body for a zone covering [`square`] at `(min_x, 0.0)`.
pub fn zone_body(min_x: f64) -> serde_json::Value {
    serde_json::json!({
        "geometry": square(min_x, 0.0),
        "category": "no_alert",
        "description": "test zone",
    })
}
