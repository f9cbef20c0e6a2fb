//! Zone entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use zonal_core::types::{DbId, Timestamp};

/// A row from the `zones` table.
///
/// `deleted_at` is a tombstone: once set it is never cleared, and public
/// read paths filter on it. The lock columns are raw storage; whether a
/// lease is live is always decided against `now` via `zonal_core::lease`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Zone {
    pub id: DbId,
    pub geometry: serde_json::Value,
    pub category_id: DbId,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_by: Option<String>,
    pub updated_at: Option<Timestamp>,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub locked_by: Option<String>,
    pub lock_expires_at: Option<Timestamp>,
}

/// DTO for creating a new zone.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateZone {
    /// Raw GeoJSON `Polygon` or `MultiPolygon`; validated before insert.
    pub geometry: serde_json::Value,
    /// Category code, resolved against `zone_categories`.
    pub category: String,
    pub description: Option<String>,
}

/// DTO for updating an existing zone. Omitted fields keep their value.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateZone {
    pub geometry: Option<serde_json::Value>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl UpdateZone {
    /// Whether the patch changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.geometry.is_none() && self.category.is_none() && self.description.is_none()
    }
}
