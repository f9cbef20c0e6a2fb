//! Handler for quota introspection.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use zonal_core::quota::{self, QuotaUsage};
use zonal_db::ZoneLifecycle;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional quota day override, `day=YYYY-MM-DD` in the configured timezone.
#[derive(Debug, Deserialize)]
pub struct QuotaQuery {
    pub day: Option<NaiveDate>,
}

/// Usage breakdown for one quota day.
#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    /// The quota day the counts cover, in the configured timezone.
    pub day: NaiveDate,
    #[serde(flatten)]
    pub usage: QuotaUsage,
}

/// GET /api/v1/quota
///
/// Report the caller's used and remaining credits per action for one quota
/// day (today by default). Derived by replaying the ledger; no cache.
pub async fn get_quota(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<QuotaQuery>,
) -> AppResult<impl IntoResponse> {
    let tz = state.config.quota_timezone;
    let day = query.day.unwrap_or_else(|| quota::quota_day(Utc::now(), tz));

    let usage = ZoneLifecycle::usage_on(&state.pool, &auth.user_id, day, tz).await?;

    Ok(Json(DataResponse {
        data: QuotaResponse { day, usage },
    }))
}
