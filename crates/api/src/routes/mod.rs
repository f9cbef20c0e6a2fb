pub mod categories;
pub mod health;
pub mod quota;
pub mod zones;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /zones                        list (?min_lng&min_lat&max_lng&max_lat), create
/// /zones/by-coordinate          active zones containing a point (?lng&lat)
/// /zones/{id}                   get, update, soft delete
/// /zones/{id}/checkout          acquire or renew the edit lease (POST)
/// /zones/{id}/release           release the edit lease (POST)
/// /zones/{id}/lock              lock status (GET)
/// /zones/{id}/audit             ledger history (GET)
///
/// /quota                        caller's usage for one quota day (?day)
///
/// /categories                   list, create (admin)
/// /categories/{id}              delete (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/zones", zones::router())
        .nest("/quota", quota::router())
        .nest("/categories", categories::router())
}
