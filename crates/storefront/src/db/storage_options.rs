//! Storage option repository.

use sqlx::SqlitePool;

use sib_store_core::{CategoryId, ModelId, StorageId};

use super::RepositoryError;
use crate::models::catalog::{StorageOption, StorageOptionInput};

#[derive(Debug, sqlx::FromRow)]
struct StorageOptionRow {
    id: i64,
    name_en: String,
    name_fa: String,
    category_id: Option<i64>,
    display_order: i64,
}

impl From<StorageOptionRow> for StorageOption {
    fn from(row: StorageOptionRow) -> Self {
        Self {
            id: StorageId::new(row.id),
            name_en: row.name_en,
            name_fa: row.name_fa,
            category_id: row.category_id.map(CategoryId::new),
            display_order: row.display_order,
        }
    }
}

/// Repository for storage option database operations.
pub struct StorageOptionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StorageOptionRepository<'a> {
    /// Create a new storage option repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List storage options by display order.
    ///
    /// - `category_id`: unrestricted options plus those restricted to the category.
    /// - `model_id`: only options with an active price row for that model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category_id: Option<CategoryId>,
        model_id: Option<ModelId>,
    ) -> Result<Vec<StorageOption>, RepositoryError> {
        let rows = sqlx::query_as::<_, StorageOptionRow>(
            "SELECT s.id, s.name_en, s.name_fa, s.category_id, s.display_order
             FROM storage_options s
             WHERE (?1 IS NULL OR s.category_id IS NULL OR s.category_id = ?1)
               AND (?2 IS NULL OR EXISTS (
                   SELECT 1 FROM product_prices p
                   WHERE p.storage_id = s.id AND p.model_id = ?2 AND p.is_active = 1
               ))
             ORDER BY s.display_order, s.id",
        )
        .bind(category_id.map(CategoryId::as_i64))
        .bind(model_id.map(ModelId::as_i64))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StorageOption::from).collect())
    }

    /// Get a storage option by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StorageId) -> Result<Option<StorageOption>, RepositoryError> {
        let row = sqlx::query_as::<_, StorageOptionRow>(
            "SELECT id, name_en, name_fa, category_id, display_order
             FROM storage_options WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(StorageOption::from))
    }

    /// Create a storage option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    pub async fn create(
        &self,
        input: &StorageOptionInput,
    ) -> Result<StorageOption, RepositoryError> {
        let row = sqlx::query_as::<_, StorageOptionRow>(
            "INSERT INTO storage_options (name_en, name_fa, category_id, display_order)
             VALUES (?, ?, ?, ?)
             RETURNING id, name_en, name_fa, category_id, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(input.category_id.map(CategoryId::as_i64))
        .bind(input.display_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "storage option"))?;

        Ok(row.into())
    }

    /// Replace all fields of a storage option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option does not exist.
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    pub async fn update(
        &self,
        id: StorageId,
        input: &StorageOptionInput,
    ) -> Result<StorageOption, RepositoryError> {
        let row = sqlx::query_as::<_, StorageOptionRow>(
            "UPDATE storage_options
             SET name_en = ?, name_fa = ?, category_id = ?, display_order = ?
             WHERE id = ?
             RETURNING id, name_en, name_fa, category_id, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(input.category_id.map(CategoryId::as_i64))
        .bind(input.display_order)
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "storage option"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a storage option and its price rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the option does not exist.
    pub async fn delete(&self, id: StorageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storage_options WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
