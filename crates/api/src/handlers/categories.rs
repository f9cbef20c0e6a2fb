//! Handlers for zone category administration.
//!
//! Listing is public; create and delete require the `admin` role. Deletion
//! is refused while any zone row, live or tombstoned, still references the
//! category, so categories with history are permanent.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use zonal_core::category::validate_new_category;
use zonal_core::error::CoreError;
use zonal_core::types::DbId;
use zonal_db::models::category::CreateZoneCategory;
use zonal_db::repositories::CategoryRepo;
use zonal_events::{kinds, ZoneEvent};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/categories
///
/// List all categories, ordered by code.
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
///
/// Create a category. Admin only; codes are short lowercase identifiers
/// and must be unique.
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateZoneCategory>,
) -> AppResult<impl IntoResponse> {
    validate_new_category(&input.code, &input.name, &input.color_hex)?;

    if CategoryRepo::find_by_code(&state.pool, &input.code)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category code '{}' already exists",
            input.code
        ))));
    }

    // A concurrent insert can still slip past the pre-check; the unique
    // constraint turns that into a 409 as well.
    let category = CategoryRepo::create(&state.pool, &input, Utc::now()).await?;

    tracing::info!(category_id = category.id, code = %category.code, actor = %admin.user_id, "Category created");
    state.event_bus.publish(
        ZoneEvent::new(kinds::CATEGORY_CREATED)
            .with_category(category.id)
            .with_actor(&admin.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// DELETE /api/v1/categories/{id}
///
/// Delete an unreferenced category. Admin only; 409 while any zone row
/// still points at it.
pub async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let category = CategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "category",
            id,
        }))?;

    let deleted = CategoryRepo::delete_unreferenced(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Category '{}' is still referenced by zones",
            category.code
        ))));
    }

    tracing::info!(category_id = id, code = %category.code, actor = %admin.user_id, "Category deleted");
    state.event_bus.publish(
        ZoneEvent::new(kinds::CATEGORY_DELETED)
            .with_category(id)
            .with_actor(&admin.user_id),
    );

    Ok(StatusCode::NO_CONTENT)
}
