//! Route definitions for zones, edit leases, and audit history.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::zones;
use crate::state::AppState;

/// Zone routes mounted at `/zones`.
///
/// ```text
/// GET    /                   -> list_zones
/// POST   /                   -> create_zone
/// GET    /by-coordinate      -> zones_by_coordinate
/// GET    /{id}               -> get_zone
/// PUT    /{id}               -> update_zone
/// DELETE /{id}               -> delete_zone
/// POST   /{id}/checkout      -> checkout_zone
/// POST   /{id}/release       -> release_zone
/// GET    /{id}/lock          -> get_lock_status
/// GET    /{id}/audit         -> zone_audit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(zones::list_zones).post(zones::create_zone))
        .route("/by-coordinate", get(zones::zones_by_coordinate))
        .route(
            "/{id}",
            get(zones::get_zone)
                .put(zones::update_zone)
                .delete(zones::delete_zone),
        )
        .route("/{id}/checkout", post(zones::checkout_zone))
        .route("/{id}/release", post(zones::release_zone))
        .route("/{id}/lock", get(zones::get_lock_status))
        .route("/{id}/audit", get(zones::zone_audit))
}
