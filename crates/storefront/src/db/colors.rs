//! Color repository.

use sqlx::SqlitePool;

use sib_store_core::{ColorId, ModelId};

use super::RepositoryError;
use crate::models::catalog::{Color, ColorInput};

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    id: i64,
    name_en: String,
    name_fa: String,
    hex_code: String,
    display_order: i64,
}

impl From<ColorRow> for Color {
    fn from(row: ColorRow) -> Self {
        Self {
            id: ColorId::new(row.id),
            name_en: row.name_en,
            name_fa: row.name_fa,
            hex_code: row.hex_code,
            display_order: row.display_order,
        }
    }
}

/// Repository for color database operations.
pub struct ColorRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ColorRepository<'a> {
    /// Create a new color repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List colors by display order.
    ///
    /// With `model_id`, only colors that have an active price row for that
    /// model are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, model_id: Option<ModelId>) -> Result<Vec<Color>, RepositoryError> {
        let rows = sqlx::query_as::<_, ColorRow>(
            "SELECT c.id, c.name_en, c.name_fa, c.hex_code, c.display_order
             FROM colors c
             WHERE ?1 IS NULL OR EXISTS (
                 SELECT 1 FROM product_prices p
                 WHERE p.color_id = c.id AND p.model_id = ?1 AND p.is_active = 1
             )
             ORDER BY c.display_order, c.id",
        )
        .bind(model_id.map(ModelId::as_i64))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Color::from).collect())
    }

    /// Get a color by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ColorId) -> Result<Option<Color>, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            "SELECT id, name_en, name_fa, hex_code, display_order FROM colors WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Color::from))
    }

    /// Create a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ColorInput) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            "INSERT INTO colors (name_en, name_fa, hex_code, display_order)
             VALUES (?, ?, ?, ?)
             RETURNING id, name_en, name_fa, hex_code, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(&input.hex_code)
        .bind(input.display_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "color"))?;

        Ok(row.into())
    }

    /// Replace all fields of a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color does not exist.
    pub async fn update(&self, id: ColorId, input: &ColorInput) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            "UPDATE colors
             SET name_en = ?, name_fa = ?, hex_code = ?, display_order = ?
             WHERE id = ?
             RETURNING id, name_en, name_fa, hex_code, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(&input.hex_code)
        .bind(input.display_order)
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "color"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a color and its price rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color does not exist.
    pub async fn delete(&self, id: ColorId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM colors WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
