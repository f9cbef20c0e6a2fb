use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use zonal_core::error::CoreError;
use zonal_db::DbError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
/// `{ "error", "code" }`, plus a `"details"` object for the variants that
/// carry structure (lease holder, quota breakdown, conflicting zone).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `zonal_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the persistence layer.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Core(core) => classify_core_error(core),

            // DbError keeps domain and database failures separate; unwrap
            // each side into its own mapping.
            AppError::Db(DbError::Core(core)) => classify_core_error(core),
            AppError::Db(DbError::Sqlx(err)) => classify_sqlx_error(err),

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to an HTTP status, stable error code, message, and
/// optional details payload.
fn classify_core_error(
    core: &CoreError,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::Validation(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
        }
        CoreError::AlreadyLocked {
            zone_id,
            holder,
            expires_at,
        } => (
            StatusCode::FORBIDDEN,
            "ALREADY_LOCKED",
            format!("Zone {zone_id} is locked by {holder} until {expires_at}"),
            Some(json!({
                "zone_id": zone_id,
                "locked_by": holder,
                "lock_expires_at": expires_at,
            })),
        ),
        CoreError::LockMismatch { zone_id, holder } => (
            StatusCode::FORBIDDEN,
            "LOCK_MISMATCH",
            format!("Zone {zone_id} is locked by {holder}"),
            Some(json!({ "zone_id": zone_id, "locked_by": holder })),
        ),
        CoreError::LockExpired { zone_id } => (
            StatusCode::CONFLICT,
            "LOCK_EXPIRED",
            format!("Edit lease on zone {zone_id} has expired or was never acquired"),
            Some(json!({ "zone_id": zone_id })),
        ),
        CoreError::QuotaExceeded {
            action,
            used,
            limit,
            usage,
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            "QUOTA_EXCEEDED",
            format!("Daily {action} quota reached ({used}/{limit})"),
            Some(json!({ "action": action, "usage": usage })),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        CoreError::InvalidGeometry(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_GEOMETRY",
            format!("Invalid geometry: {msg}"),
            None,
        ),
        CoreError::GeometryConflict {
            conflicting_zone_id,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "GEOMETRY_CONFLICT",
            format!("Geometry overlaps existing zone {conflicting_zone_id}"),
            Some(json!({ "conflicting_zone_id": conflicting_zone_id })),
        ),
        CoreError::Unauthorized(msg) => {
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
        }
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(
    err: &sqlx::Error,
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
            None,
        ),
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                    None,
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
    }
}
