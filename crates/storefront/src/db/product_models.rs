//! Product model repository.

use sqlx::SqlitePool;

use sib_store_core::{CategoryId, ModelId};

use super::RepositoryError;
use crate::models::catalog::{ProductModel, ProductModelInput};

const COLUMNS: &str =
    "id, category_id, name_en, name_fa, generation, image_url, display_order, is_active";

#[derive(Debug, sqlx::FromRow)]
struct ProductModelRow {
    id: i64,
    category_id: i64,
    name_en: String,
    name_fa: String,
    generation: Option<String>,
    image_url: Option<String>,
    display_order: i64,
    is_active: bool,
}

impl From<ProductModelRow> for ProductModel {
    fn from(row: ProductModelRow) -> Self {
        Self {
            id: ModelId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name_en: row.name_en,
            name_fa: row.name_fa,
            generation: row.generation,
            image_url: row.image_url,
            display_order: row.display_order,
            is_active: row.is_active,
        }
    }
}

/// Repository for product model database operations.
pub struct ProductModelRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductModelRepository<'a> {
    /// Create a new product model repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List models by display order, optionally within one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category_id: Option<CategoryId>,
        include_inactive: bool,
    ) -> Result<Vec<ProductModel>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS}
             FROM product_models
             WHERE (?1 IS NULL OR category_id = ?1)
               AND (?2 OR is_active = 1)
             ORDER BY display_order, id"
        );
        let rows = sqlx::query_as::<_, ProductModelRow>(&sql)
            .bind(category_id.map(CategoryId::as_i64))
            .bind(include_inactive)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductModel::from).collect())
    }

    /// Get a model by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ModelId) -> Result<Option<ProductModel>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM product_models WHERE id = ?");
        let row = sqlx::query_as::<_, ProductModelRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(ProductModel::from))
    }

    /// Create a model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &ProductModelInput) -> Result<ProductModel, RepositoryError> {
        let sql = format!(
            "INSERT INTO product_models
                 (category_id, name_en, name_fa, generation, image_url, display_order, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductModelRow>(&sql)
            .bind(input.category_id.as_i64())
            .bind(&input.name_en)
            .bind(&input.name_fa)
            .bind(&input.generation)
            .bind(&input.image_url)
            .bind(input.display_order)
            .bind(input.is_active)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "model"))?;

        Ok(row.into())
    }

    /// Replace all fields of a model.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the model does not exist.
    /// Returns `RepositoryError::InvalidReference` if the category does not exist.
    pub async fn update(
        &self,
        id: ModelId,
        input: &ProductModelInput,
    ) -> Result<ProductModel, RepositoryError> {
        let sql = format!(
            "UPDATE product_models
             SET category_id = ?, name_en = ?, name_fa = ?, generation = ?,
                 image_url = ?, display_order = ?, is_active = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductModelRow>(&sql)
            .bind(input.category_id.as_i64())
            .bind(&input.name_en)
            .bind(&input.name_fa)
            .bind(&input.generation)
            .bind(&input.image_url)
            .bind(input.display_order)
            .bind(input.is_active)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "model"))?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a model and its price rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the model does not exist.
    pub async fn delete(&self, id: ModelId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_models WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
