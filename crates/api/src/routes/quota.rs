//! Route definition for quota introspection.

use axum::routing::get;
use axum::Router;

use crate::handlers::quota;
use crate::state::AppState;

/// Quota routes mounted at `/quota`.
///
/// ```text
/// GET /    -> get_quota
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(quota::get_quota))
}
