//! Category repository.

use sqlx::SqlitePool;

use sib_store_core::CategoryId;

use super::RepositoryError;
use crate::models::catalog::{Category, CategoryInput};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name_en: String,
    name_fa: String,
    slug: String,
    display_order: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name_en: row.name_en,
            name_fa: row.name_fa,
            slug: row.slug,
            display_order: row.display_order,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all categories by display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name_en, name_fa, slug, display_order
             FROM categories
             ORDER BY display_order, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name_en, name_fa, slug, display_order
             FROM categories
             WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name_en, name_fa, slug, display_order)
             VALUES (?, ?, ?, ?)
             RETURNING id, name_en, name_fa, slug, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(input.slug())
        .bind(input.display_order)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category slug"))?;

        Ok(row.into())
    }

    /// Replace all fields of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories
             SET name_en = ?, name_fa = ?, slug = ?, display_order = ?
             WHERE id = ?
             RETURNING id, name_en, name_fa, slug, display_order",
        )
        .bind(&input.name_en)
        .bind(&input.name_fa)
        .bind(input.slug())
        .bind(input.display_order)
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category slug"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category and, through cascades, its models and their prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn input(name: &str, slug: &str) -> CategoryInput {
        CategoryInput {
            name_en: name.to_string(),
            name_fa: name.to_string(),
            slug: Some(slug.to_string()),
            display_order: 0,
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let pool = test_support::pool().await;
        let repo = CategoryRepository::new(&pool);

        let created = repo.create(&input("iPhone", "iphone")).await.unwrap();
        assert_eq!(repo.get(created.id).await.unwrap(), Some(created.clone()));

        repo.delete(created.id).await.unwrap();
        assert_eq!(repo.get(created.id).await.unwrap(), None);
        assert!(matches!(
            repo.delete(created.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let pool = test_support::pool().await;
        let repo = CategoryRepository::new(&pool);

        repo.create(&input("iPad", "ipad")).await.unwrap();
        let err = repo.create(&input("iPad 2", "ipad")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let pool = test_support::pool().await;
        let repo = CategoryRepository::new(&pool);

        let err = repo
            .update(CategoryId::new(42), &input("Mac", "mac"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
