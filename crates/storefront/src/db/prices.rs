//! Product price repository.
//!
//! Price rows are keyed by the unique (model, color, storage) triple, so
//! creation is an upsert on that key.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use sib_store_core::{CategoryId, ColorId, ModelId, Price, PriceId, StorageId};

use super::RepositoryError;
use crate::models::catalog::{
    Color, ColorPrice, PriceFilter, ProductPrice, ProductPriceInput, StorageOption,
};

const COLUMNS: &str = "id, model_id, color_id, storage_id, price, stock, is_active, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductPriceRow {
    id: i64,
    model_id: i64,
    color_id: i64,
    storage_id: i64,
    price: i64,
    stock: i64,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductPriceRow> for ProductPrice {
    type Error = RepositoryError;

    fn try_from(row: ProductPriceRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in row {}: {e}", row.id))
        })?;

        Ok(Self {
            id: PriceId::new(row.id),
            model_id: ModelId::new(row.model_id),
            color_id: ColorId::new(row.color_id),
            storage_id: StorageId::new(row.storage_id),
            price,
            stock: row.stock,
            is_active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

/// Joined row used to build the product details tree.
#[derive(Debug, sqlx::FromRow)]
struct PricedOptionRow {
    price_id: i64,
    price: i64,
    stock: i64,
    storage_id: i64,
    storage_name_en: String,
    storage_name_fa: String,
    storage_category_id: Option<i64>,
    storage_display_order: i64,
    color_id: i64,
    color_name_en: String,
    color_name_fa: String,
    hex_code: String,
    color_display_order: i64,
}

impl PricedOptionRow {
    fn into_parts(self) -> Result<(StorageOption, ColorPrice), RepositoryError> {
        let price = Price::new(self.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in row {}: {e}", self.price_id))
        })?;

        let storage = StorageOption {
            id: StorageId::new(self.storage_id),
            name_en: self.storage_name_en,
            name_fa: self.storage_name_fa,
            category_id: self.storage_category_id.map(CategoryId::new),
            display_order: self.storage_display_order,
        };
        let color = ColorPrice {
            color: Color {
                id: ColorId::new(self.color_id),
                name_en: self.color_name_en,
                name_fa: self.color_name_fa,
                hex_code: self.hex_code,
                display_order: self.color_display_order,
            },
            price,
            stock: self.stock,
            price_id: PriceId::new(self.price_id),
        };
        Ok((storage, color))
    }
}

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Repository for product price database operations.
pub struct PriceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PriceRepository<'a> {
    /// Create a new price repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List price rows matching the filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &PriceFilter) -> Result<Vec<ProductPrice>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS}
             FROM product_prices
             WHERE (?1 IS NULL OR model_id = ?1)
               AND (?2 IS NULL OR color_id = ?2)
               AND (?3 IS NULL OR storage_id = ?3)
               AND (?4 OR is_active = 1)
             ORDER BY model_id, storage_id, color_id"
        );
        let rows = sqlx::query_as::<_, ProductPriceRow>(&sql)
            .bind(filter.model_id.map(ModelId::as_i64))
            .bind(filter.color_id.map(ColorId::as_i64))
            .bind(filter.storage_id.map(StorageId::as_i64))
            .bind(filter.include_inactive)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(ProductPrice::try_from).collect()
    }

    /// Get a price row by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PriceId) -> Result<Option<ProductPrice>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM product_prices WHERE id = ?");
        let row = sqlx::query_as::<_, ProductPriceRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(ProductPrice::try_from).transpose()
    }

    /// Get the active price row for one combination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active(
        &self,
        model_id: ModelId,
        color_id: ColorId,
        storage_id: StorageId,
    ) -> Result<Option<ProductPrice>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS}
             FROM product_prices
             WHERE model_id = ? AND color_id = ? AND storage_id = ? AND is_active = 1"
        );
        let row = sqlx::query_as::<_, ProductPriceRow>(&sql)
            .bind(model_id.as_i64())
            .bind(color_id.as_i64())
            .bind(storage_id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(ProductPrice::try_from).transpose()
    }

    /// Insert a price row, or replace price, stock and active flag of the
    /// existing row for the same (model, color, storage).
    ///
    /// The outcome comes from the write itself, so concurrent creates of one
    /// combination report exactly one `Created`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if a referenced catalog
    /// entry does not exist or the amount is out of range, and
    /// `RepositoryError::NotFound` if the row vanished mid-update.
    pub async fn upsert(
        &self,
        input: &ProductPriceInput,
    ) -> Result<(ProductPrice, UpsertOutcome), RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let insert = format!(
            "INSERT INTO product_prices
                 (model_id, color_id, storage_id, price, stock, is_active, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (model_id, color_id, storage_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ProductPriceRow>(&insert)
            .bind(input.model_id.as_i64())
            .bind(input.color_id.as_i64())
            .bind(input.storage_id.as_i64())
            .bind(input.price)
            .bind(input.stock)
            .bind(input.is_active)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_write(e, "price"))?;

        let (row, outcome) = if let Some(row) = inserted {
            (row, UpsertOutcome::Created)
        } else {
            let update = format!(
                "UPDATE product_prices
                 SET price = ?, stock = ?, is_active = ?, updated_at = ?
                 WHERE model_id = ? AND color_id = ? AND storage_id = ?
                 RETURNING {COLUMNS}"
            );
            let row = sqlx::query_as::<_, ProductPriceRow>(&update)
                .bind(input.price)
                .bind(input.stock)
                .bind(input.is_active)
                .bind(now)
                .bind(input.model_id.as_i64())
                .bind(input.color_id.as_i64())
                .bind(input.storage_id.as_i64())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepositoryError::from_write(e, "price"))?
                .ok_or(RepositoryError::NotFound)?;
            (row, UpsertOutcome::Updated)
        };

        tx.commit().await?;
        Ok((row.try_into()?, outcome))
    }

    /// Update price, stock and active flag of an existing row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn update(
        &self,
        id: PriceId,
        input: &ProductPriceInput,
    ) -> Result<ProductPrice, RepositoryError> {
        let sql = format!(
            "UPDATE product_prices
             SET price = ?, stock = ?, is_active = ?, updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductPriceRow>(&sql)
            .bind(input.price)
            .bind(input.stock)
            .bind(input.is_active)
            .bind(Utc::now())
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "price"))?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a price row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn delete(&self, id: PriceId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_prices WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Active price rows for a model joined with their storage option and
    /// color, ordered by storage then color display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn priced_options(
        &self,
        model_id: ModelId,
    ) -> Result<Vec<(StorageOption, ColorPrice)>, RepositoryError> {
        let rows = sqlx::query_as::<_, PricedOptionRow>(
            "SELECT p.id AS price_id, p.price, p.stock,
                    s.id AS storage_id, s.name_en AS storage_name_en,
                    s.name_fa AS storage_name_fa, s.category_id AS storage_category_id,
                    s.display_order AS storage_display_order,
                    c.id AS color_id, c.name_en AS color_name_en,
                    c.name_fa AS color_name_fa, c.hex_code,
                    c.display_order AS color_display_order
             FROM product_prices p
             JOIN storage_options s ON s.id = p.storage_id
             JOIN colors c ON c.id = p.color_id
             WHERE p.model_id = ? AND p.is_active = 1
             ORDER BY s.display_order, s.id, c.display_order, c.id",
        )
        .bind(model_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PricedOptionRow::into_parts).collect()
    }

    /// Lowest active price per active model, for the chat assistant's context.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn starting_prices(&self) -> Result<Vec<(ModelId, Price)>, RepositoryError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT p.model_id, MIN(p.price)
             FROM product_prices p
             JOIN product_models m ON m.id = p.model_id
             WHERE p.is_active = 1 AND m.is_active = 1
             GROUP BY p.model_id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(model_id, price)| {
                Price::new(price)
                    .map(|price| (ModelId::new(model_id), price))
                    .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{
        CategoryRepository, ColorRepository, ProductModelRepository, StorageOptionRepository,
        test_support,
    };
    use crate::models::catalog::{
        CategoryInput, ColorInput, ProductModelInput, StorageOptionInput,
    };

    /// One category, one model, two colors and two storage options.
    pub(crate) struct Fixture {
        pub model: ModelId,
        pub black: ColorId,
        pub white: ColorId,
        pub gb128: StorageId,
        pub gb256: StorageId,
    }

    pub(crate) async fn fixture(pool: &SqlitePool) -> Fixture {
        let category = CategoryRepository::new(pool)
            .create(&CategoryInput {
                name_en: "iPhone".to_string(),
                name_fa: "آیفون".to_string(),
                slug: Some("iphone".to_string()),
                display_order: 0,
            })
            .await
            .unwrap();
        let model = ProductModelRepository::new(pool)
            .create(&ProductModelInput {
                category_id: category.id,
                name_en: "iPhone 16 Pro".to_string(),
                name_fa: "آیفون ۱۶ پرو".to_string(),
                generation: None,
                image_url: None,
                display_order: 0,
                is_active: true,
            })
            .await
            .unwrap();

        let colors = ColorRepository::new(pool);
        let black = colors
            .create(&ColorInput {
                name_en: "Black Titanium".to_string(),
                name_fa: "مشکی".to_string(),
                hex_code: "#1C1C1E".to_string(),
                display_order: 1,
            })
            .await
            .unwrap();
        let white = colors
            .create(&ColorInput {
                name_en: "White Titanium".to_string(),
                name_fa: "سفید".to_string(),
                hex_code: "#F2F1EB".to_string(),
                display_order: 2,
            })
            .await
            .unwrap();

        let storages = StorageOptionRepository::new(pool);
        let gb128 = storages
            .create(&StorageOptionInput {
                name_en: "128GB".to_string(),
                name_fa: "۱۲۸ گیگابایت".to_string(),
                category_id: None,
                display_order: 1,
            })
            .await
            .unwrap();
        let gb256 = storages
            .create(&StorageOptionInput {
                name_en: "256GB".to_string(),
                name_fa: "۲۵۶ گیگابایت".to_string(),
                category_id: Some(category.id),
                display_order: 2,
            })
            .await
            .unwrap();

        Fixture {
            model: model.id,
            black: black.id,
            white: white.id,
            gb128: gb128.id,
            gb256: gb256.id,
        }
    }

    fn input(f: &Fixture, color: ColorId, storage: StorageId, price: i64) -> ProductPriceInput {
        ProductPriceInput {
            model_id: f.model,
            color_id: color,
            storage_id: storage,
            price,
            stock: 1,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let pool = test_support::pool().await;
        let f = fixture(&pool).await;
        let repo = PriceRepository::new(&pool);

        let (first, outcome) = repo.upsert(&input(&f, f.black, f.gb128, 100)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let (second, outcome) = repo.upsert(&input(&f, f.black, f.gb128, 150)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(second.id, first.id);
        assert_eq!(second.price.toman(), 150);
        assert_eq!(repo.list(&PriceFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_report_one_created() {
        let pool = test_support::pool().await;
        let f = fixture(&pool).await;
        let repo = PriceRepository::new(&pool);

        let a = input(&f, f.white, f.gb256, 100);
        let b = input(&f, f.white, f.gb256, 120);
        let (first, second) = tokio::join!(repo.upsert(&a), repo.upsert(&b));
        let mut outcomes = [first.unwrap().1, second.unwrap().1];
        outcomes.sort_by_key(|o| *o == UpsertOutcome::Updated);
        assert_eq!(outcomes, [UpsertOutcome::Created, UpsertOutcome::Updated]);
        assert_eq!(repo.list(&PriceFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_unknown_model_is_invalid_reference() {
        let pool = test_support::pool().await;
        let f = fixture(&pool).await;
        let repo = PriceRepository::new(&pool);

        let mut bad = input(&f, f.black, f.gb128, 100);
        bad.model_id = ModelId::new(999);
        assert!(matches!(
            repo.upsert(&bad).await,
            Err(RepositoryError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_priced_options_skips_inactive_and_orders() {
        let pool = test_support::pool().await;
        let f = fixture(&pool).await;
        let repo = PriceRepository::new(&pool);

        repo.upsert(&input(&f, f.white, f.gb256, 300)).await.unwrap();
        repo.upsert(&input(&f, f.black, f.gb256, 290)).await.unwrap();
        repo.upsert(&input(&f, f.black, f.gb128, 250)).await.unwrap();
        let mut hidden = input(&f, f.white, f.gb128, 260);
        hidden.is_active = false;
        repo.upsert(&hidden).await.unwrap();

        let options = repo.priced_options(f.model).await.unwrap();
        let ids: Vec<_> = options.iter().map(|(s, c)| (s.id, c.color.id)).collect();
        assert_eq!(
            ids,
            vec![(f.gb128, f.black), (f.gb256, f.black), (f.gb256, f.white)]
        );

        let starting = repo.starting_prices().await.unwrap();
        assert_eq!(starting, vec![(f.model, Price::new(250).unwrap())]);
    }

    #[tokio::test]
    async fn test_color_delete_cascades_to_prices() {
        let pool = test_support::pool().await;
        let f = fixture(&pool).await;
        let repo = PriceRepository::new(&pool);

        let (price, _) = repo.upsert(&input(&f, f.white, f.gb128, 100)).await.unwrap();
        ColorRepository::new(&pool).delete(f.white).await.unwrap();
        assert_eq!(repo.get(price.id).await.unwrap(), None);
    }
}
