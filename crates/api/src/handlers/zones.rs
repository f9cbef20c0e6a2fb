//! Handlers for the zone lifecycle, edit leases, and audit history.
//!
//! Mutations delegate to `ZoneLifecycle`, which owns the transactional gate
//! order (lease, quota, geometry); each handler publishes one event on the
//! bus strictly after its transaction has committed. Read endpoints filter
//! lease fields through `lease::public_lock_fields` so expired holders are
//! never shown.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use zonal_core::error::CoreError;
use zonal_core::geometry;
use zonal_core::lease::{self, ReleaseAction};
use zonal_core::types::{DbId, Timestamp};
use zonal_db::models::zone::{CreateZone, UpdateZone, Zone};
use zonal_db::repositories::{AuditRepo, ZoneRepo};
use zonal_db::ZoneLifecycle;
use zonal_events::{kinds, ZoneEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// Public view of a zone row.
///
/// Tombstone columns are omitted (deleted zones never reach public reads)
/// and the lock columns are filtered against `now`, so an expired lease
/// reads as no lease at all.
#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    pub id: DbId,
    pub geometry: serde_json::Value,
    pub category_id: DbId,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_by: Option<String>,
    pub updated_at: Option<Timestamp>,
    pub locked_by: Option<String>,
    pub lock_expires_at: Option<Timestamp>,
}

impl ZoneResponse {
    fn from_zone(zone: Zone, now: Timestamp) -> Self {
        let (locked_by, lock_expires_at) =
            lease::public_lock_fields(zone.locked_by.as_deref(), zone.lock_expires_at, now);
        Self {
            id: zone.id,
            geometry: zone.geometry,
            category_id: zone.category_id,
            description: zone.description,
            created_by: zone.created_by,
            created_at: zone.created_at,
            updated_by: zone.updated_by,
            updated_at: zone.updated_at,
            locked_by,
            lock_expires_at,
        }
    }
}

/// Lock status of a single zone, as reported by `GET /zones/{id}/lock`.
#[derive(Debug, Serialize)]
pub struct LockStatusResponse {
    pub zone_id: DbId,
    pub locked: bool,
    pub locked_by: Option<String>,
    pub lock_expires_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Optional bounding-box filter for the zone list. All four bounds must be
/// given together.
#[derive(Debug, Deserialize)]
pub struct BboxQuery {
    pub min_lng: Option<f64>,
    pub min_lat: Option<f64>,
    pub max_lng: Option<f64>,
    pub max_lat: Option<f64>,
}

impl BboxQuery {
    /// Resolve the query into a complete box, `None`, or a client error.
    fn resolve(&self) -> AppResult<Option<(f64, f64, f64, f64)>> {
        match (self.min_lng, self.min_lat, self.max_lng, self.max_lat) {
            (Some(min_lng), Some(min_lat), Some(max_lng), Some(max_lat)) => {
                if min_lng > max_lng || min_lat > max_lat {
                    return Err(AppError::BadRequest(
                        "bbox minimum must not exceed maximum".into(),
                    ));
                }
                Ok(Some((min_lng, min_lat, max_lng, max_lat)))
            }
            (None, None, None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "bbox filter requires min_lng, min_lat, max_lng and max_lat together".into(),
            )),
        }
    }
}

/// Point query for `GET /zones/by-coordinate`.
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub lng: f64,
    pub lat: f64,
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

/// GET /api/v1/zones
///
/// List all active zones, optionally restricted to those whose bounding
/// rectangle intersects the given box. Zones whose stored geometry cannot
/// be parsed are skipped by the filter.
pub async fn list_zones(
    State(state): State<AppState>,
    Query(query): Query<BboxQuery>,
) -> AppResult<impl IntoResponse> {
    let bbox = query.resolve()?;
    let now = Utc::now();

    let zones = ZoneRepo::list_active(&state.pool).await?;
    let zones: Vec<ZoneResponse> = zones
        .into_iter()
        .filter(|zone| match bbox {
            Some((min_lng, min_lat, max_lng, max_lat)) => geometry::parse_stored(&zone.geometry)
                .is_some_and(|g| {
                    geometry::intersects_bbox(&g, min_lng, min_lat, max_lng, max_lat)
                }),
            None => true,
        })
        .map(|zone| ZoneResponse::from_zone(zone, now))
        .collect();

    Ok(Json(DataResponse { data: zones }))
}

/// GET /api/v1/zones/by-coordinate?lng=&lat=
///
/// List the active zones whose geometry contains the given point.
pub async fn zones_by_coordinate(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();

    let zones = ZoneRepo::list_active(&state.pool).await?;
    let zones: Vec<ZoneResponse> = zones
        .into_iter()
        .filter(|zone| {
            geometry::parse_stored(&zone.geometry)
                .is_some_and(|g| geometry::contains_point(&g, query.lng, query.lat))
        })
        .map(|zone| ZoneResponse::from_zone(zone, now))
        .collect();

    Ok(Json(DataResponse { data: zones }))
}

/// GET /api/v1/zones/{id}
///
/// Fetch one active zone. Soft-deleted zones return 404.
pub async fn get_zone(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let zone = ZoneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "zone", id }))?;

    Ok(Json(DataResponse {
        data: ZoneResponse::from_zone(zone, Utc::now()),
    }))
}

/// GET /api/v1/zones/{id}/lock
///
/// Report whether the zone currently has a live edit lease, and by whom.
pub async fn get_lock_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let zone = ZoneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "zone", id }))?;

    let now = Utc::now();
    let (locked_by, lock_expires_at) =
        lease::public_lock_fields(zone.locked_by.as_deref(), zone.lock_expires_at, now);

    Ok(Json(DataResponse {
        data: LockStatusResponse {
            zone_id: id,
            locked: locked_by.is_some(),
            locked_by,
            lock_expires_at,
        },
    }))
}

/// GET /api/v1/zones/{id}/audit
///
/// Return the full ledger history for a zone, oldest first. History stays
/// readable after the zone is soft-deleted; a zone that never existed has
/// no CREATE entry and returns 404.
pub async fn zone_audit(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entries = AuditRepo::history_for_zone(&state.pool, id).await?;
    if entries.is_empty() {
        return Err(AppError::Core(CoreError::NotFound { entity: "zone", id }));
    }

    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// POST /api/v1/zones
///
/// Create a zone. Consumes one create credit; refused when the geometry is
/// malformed or overlaps an active zone.
pub async fn create_zone(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateZone>,
) -> AppResult<impl IntoResponse> {
    let tz = state.config.quota_timezone;
    let now = Utc::now();

    let zone = ZoneLifecycle::create(&state.pool, &auth.user_id, &input, tz, now).await?;

    tracing::info!(zone_id = zone.id, actor = %auth.user_id, "Zone created");
    state.event_bus.publish(
        ZoneEvent::new(kinds::ZONE_CREATED)
            .with_zone(zone.id)
            .with_actor(&auth.user_id)
            .with_payload(serde_json::json!({ "category_id": zone.category_id })),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ZoneResponse::from_zone(zone, now),
        }),
    ))
}

/// PUT /api/v1/zones/{id}
///
/// Update a zone. Requires a live lease held by the caller; a successful
/// update consumes one update credit and ends the lease.
pub async fn update_zone(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateZone>,
) -> AppResult<impl IntoResponse> {
    let tz = state.config.quota_timezone;
    let now = Utc::now();

    let zone = ZoneLifecycle::update(&state.pool, id, &auth.user_id, &input, tz, now).await?;

    let mut changed: Vec<&str> = Vec::new();
    if input.geometry.is_some() {
        changed.push("geometry");
    }
    if input.category.is_some() {
        changed.push("category");
    }
    if input.description.is_some() {
        changed.push("description");
    }

    tracing::info!(zone_id = zone.id, actor = %auth.user_id, ?changed, "Zone updated");
    state.event_bus.publish(
        ZoneEvent::new(kinds::ZONE_UPDATED)
            .with_zone(zone.id)
            .with_actor(&auth.user_id)
            .with_payload(serde_json::json!({ "changed": changed })),
    );

    Ok(Json(DataResponse {
        data: ZoneResponse::from_zone(zone, now),
    }))
}

/// DELETE /api/v1/zones/{id}
///
/// Soft-delete a zone. Inside the grace window this refunds the create
/// credit (ledger action `GRACE_DELETE`); otherwise it consumes one delete
/// credit. No lease is required.
pub async fn delete_zone(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tz = state.config.quota_timezone;
    let now = Utc::now();

    let outcome = ZoneLifecycle::delete(&state.pool, id, &auth.user_id, tz, now).await?;
    let ledger_action = outcome.action.as_str();

    tracing::info!(zone_id = id, actor = %auth.user_id, ledger_action, "Zone deleted");
    state.event_bus.publish(
        ZoneEvent::new(kinds::ZONE_DELETED)
            .with_zone(id)
            .with_actor(&auth.user_id)
            .with_payload(serde_json::json!({ "ledger_action": ledger_action })),
    );

    Ok(Json(DataResponse {
        data: serde_json::json!({ "deleted": true, "ledger_action": ledger_action }),
    }))
}

/// POST /api/v1/zones/{id}/checkout
///
/// Acquire the exclusive edit lease on a zone, or renew it when the caller
/// already holds it. Refused while another user's lease is live.
pub async fn checkout_zone(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();

    let zone = ZoneLifecycle::checkout(&state.pool, id, &auth.user_id, now).await?;

    tracing::info!(
        zone_id = zone.id,
        actor = %auth.user_id,
        expires_at = ?zone.lock_expires_at,
        "Lease acquired"
    );
    state.event_bus.publish(
        ZoneEvent::new(kinds::ZONE_LOCKED)
            .with_zone(zone.id)
            .with_actor(&auth.user_id)
            .with_payload(serde_json::json!({ "lock_expires_at": zone.lock_expires_at })),
    );

    Ok(Json(DataResponse {
        data: ZoneResponse::from_zone(zone, now),
    }))
}

/// POST /api/v1/zones/{id}/release
///
/// Release the caller's edit lease. Idempotent: releasing a free or expired
/// lease is a successful no-op; only a live lease held by someone else is
/// refused.
pub async fn release_zone(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();

    let action = ZoneLifecycle::release(&state.pool, id, &auth.user_id, now).await?;
    let released = action == ReleaseAction::Clear;

    if released {
        tracing::info!(zone_id = id, actor = %auth.user_id, "Lease released");
        state.event_bus.publish(
            ZoneEvent::new(kinds::ZONE_RELEASED)
                .with_zone(id)
                .with_actor(&auth.user_id),
        );
    }

    Ok(Json(DataResponse {
        data: serde_json::json!({ "released": released }),
    }))
}
