//! Repository for the `zone_categories` reference table.

use sqlx::{PgExecutor, PgPool};
use zonal_core::types::{DbId, Timestamp};

use crate::models::category::{CreateZoneCategory, ZoneCategory};

/// Column list for `zone_categories` queries.
const COLUMNS: &str = "id, code, name, color_hex, created_at";

/// Provides CRUD operations for zone categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List all categories, ordered by code.
    pub async fn list(pool: &PgPool) -> Result<Vec<ZoneCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zone_categories ORDER BY code ASC");
        sqlx::query_as::<_, ZoneCategory>(&query).fetch_all(pool).await
    }

    /// Find a category by its stable code.
    pub async fn find_by_code(
        executor: impl PgExecutor<'_>,
        code: &str,
    ) -> Result<Option<ZoneCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zone_categories WHERE code = $1");
        sqlx::query_as::<_, ZoneCategory>(&query)
            .bind(code)
            .fetch_optional(executor)
            .await
    }

    /// Find a category by id.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ZoneCategory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zone_categories WHERE id = $1");
        sqlx::query_as::<_, ZoneCategory>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a new category.
    ///
    /// A duplicate code surfaces as a unique-constraint violation for the
    /// caller to classify.
    pub async fn create(
        pool: &PgPool,
        input: &CreateZoneCategory,
        now: Timestamp,
    ) -> Result<ZoneCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO zone_categories (code, name, color_hex, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ZoneCategory>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.color_hex)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Delete a category only if no zone row references it.
    ///
    /// Soft-deleted zones keep their category reference forever, so a
    /// category with any history stays. Returns `true` if a row was deleted.
    pub async fn delete_unreferenced(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM zone_categories \
             WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM zones WHERE category_id = $1)",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
