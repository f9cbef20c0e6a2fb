//! Header-based identity extractor for Axum handlers.
//!
//! Authentication happens upstream at the fronting gateway, which forwards
//! the verified identity as `x-user-id` and `x-user-role` headers. This
//! service trusts those headers and is never exposed directly.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use zonal_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's opaque user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role; absent means [`DEFAULT_ROLE`].
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role assumed when the gateway sends no `x-user-role` header.
pub const DEFAULT_ROLE: &str = "user";

/// Caller identity extracted from the gateway headers.
///
/// Use this as an extractor parameter in any handler that requires an
/// identified caller (all mutations, the quota endpoint):
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(actor = %auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Opaque user id; recorded as `actor_id` in the audit ledger.
    pub user_id: String,
    /// The caller's role name (e.g. `"user"`, `"admin"`).
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing x-user-id header".into(),
                ))
            })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ROLE);

        Ok(AuthUser {
            user_id: user_id.to_string(),
            role: role.to_string(),
        })
    }
}
