//! Zone category entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use zonal_core::types::{DbId, Timestamp};

/// A row from the `zone_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ZoneCategory {
    pub id: DbId,
    /// Stable key clients reference zones by, e.g. `"restricted"`.
    pub code: String,
    pub name: String,
    pub color_hex: String,
    pub created_at: Timestamp,
}

/// DTO for creating a new category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateZoneCategory {
    pub code: String,
    pub name: String,
    pub color_hex: String,
}
