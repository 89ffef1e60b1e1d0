//! Seed the catalog from a YAML file.
//!
//! Entries are matched against what is already in the database (categories
//! by slug, everything else by English name), so re-running a seed only adds
//! what is missing and refreshes prices.
//!
//! ```yaml
//! colors:
//!   - nameEn: Black Titanium
//!     nameFa: مشکی
//!     hexCode: "#3C3C3D"
//! storageOptions:
//!   - nameEn: 256GB
//!     nameFa: ۲۵۶ گیگابایت
//! categories:
//!   - nameEn: iPhone
//!     nameFa: آیفون
//!     models:
//!       - nameEn: iPhone 16 Pro
//!         nameFa: آیفون ۱۶ پرو
//!         prices:
//!           - { color: Black Titanium, storage: 256GB, price: 90000000, stock: 2 }
//! ```

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use sib_store_core::{CategoryId, ColorId, ModelId, StorageId};
use sib_store_storefront::db::{
    CategoryRepository, ColorRepository, PriceRepository, ProductModelRepository,
    RepositoryError, StorageOptionRepository, UpsertOutcome,
};
use sib_store_storefront::models::ValidationError;
use sib_store_storefront::models::catalog::{
    CategoryInput, ColorInput, ProductModelInput, ProductPriceInput, StorageOptionInput, slugify,
};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{entry}: {source}")]
    Invalid {
        entry: String,
        source: ValidationError,
    },

    #[error("{0}")]
    UnknownReference(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub colors: Vec<ColorSeed>,
    #[serde(default)]
    pub storage_options: Vec<StorageSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColorSeed {
    pub name_en: String,
    pub name_fa: String,
    pub hex_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StorageSeed {
    pub name_en: String,
    pub name_fa: String,
    /// Slug of the only category this capacity applies to.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CategorySeed {
    pub name_en: String,
    pub name_fa: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSeed {
    pub name_en: String,
    pub name_fa: String,
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prices: Vec<PriceSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceSeed {
    /// English color name.
    pub color: String,
    /// English storage name.
    pub storage: String,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
}

/// What a seed run changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub existing: usize,
    pub prices_created: usize,
    pub prices_updated: usize,
}

impl fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries created, {} already present, {} prices created, {} prices updated",
            self.created, self.existing, self.prices_created, self.prices_updated
        )
    }
}

fn invalid(entry: &str) -> impl FnOnce(ValidationError) -> SeedError + '_ {
    move |source| SeedError::Invalid {
        entry: entry.to_string(),
        source,
    }
}

fn display_order(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or a database write fails.
pub async fn catalog_from_file(pool: &SqlitePool, path: &Path) -> Result<SeedSummary, SeedError> {
    info!(path = %path.display(), "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    catalog(pool, &seed).await
}

/// Seed the catalog.
///
/// # Errors
///
/// Returns an error if an entry fails validation, a price names an unknown
/// color or storage option, or a database write fails.
pub async fn catalog(pool: &SqlitePool, seed: &CatalogSeed) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    let color_ids = seed_colors(pool, &seed.colors, &mut summary).await?;
    let (category_ids, model_ids) = seed_categories(pool, &seed.categories, &mut summary).await?;
    let storage_ids =
        seed_storage(pool, &seed.storage_options, &category_ids, &mut summary).await?;

    let prices = PriceRepository::new(pool);
    for (model_seed, model_id) in seed.categories.iter().flat_map(|c| &c.models).zip(model_ids) {
        for price in &model_seed.prices {
            let color_id = lookup(&color_ids, &price.color).ok_or_else(|| {
                SeedError::UnknownReference(format!(
                    "{}: unknown color '{}'",
                    model_seed.name_en, price.color
                ))
            })?;
            let storage_id = lookup(&storage_ids, &price.storage).ok_or_else(|| {
                SeedError::UnknownReference(format!(
                    "{}: unknown storage '{}'",
                    model_seed.name_en, price.storage
                ))
            })?;

            let input = ProductPriceInput {
                model_id,
                color_id,
                storage_id,
                price: price.price,
                stock: price.stock,
                is_active: true,
            }
            .validated()
            .map_err(invalid(&model_seed.name_en))?;
            match prices.upsert(&input).await?.1 {
                UpsertOutcome::Created => summary.prices_created += 1,
                UpsertOutcome::Updated => summary.prices_updated += 1,
            }
        }
    }

    info!(%summary, "Catalog seeded");
    Ok(summary)
}

fn lookup<T: Copy>(ids: &[(String, T)], name: &str) -> Option<T> {
    ids.iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name.trim()))
        .map(|(_, id)| *id)
}

async fn seed_colors(
    pool: &SqlitePool,
    seeds: &[ColorSeed],
    summary: &mut SeedSummary,
) -> Result<Vec<(String, ColorId)>, SeedError> {
    let repo = ColorRepository::new(pool);
    let mut ids: Vec<(String, ColorId)> = repo
        .list(None)
        .await?
        .into_iter()
        .map(|c| (c.name_en, c.id))
        .collect();

    for (index, seed) in seeds.iter().enumerate() {
        if lookup(&ids, &seed.name_en).is_some() {
            summary.existing += 1;
            continue;
        }
        let input = ColorInput {
            name_en: seed.name_en.clone(),
            name_fa: seed.name_fa.clone(),
            hex_code: seed.hex_code.clone(),
            display_order: display_order(index),
        }
        .validated()
        .map_err(invalid(&seed.name_en))?;
        let color = repo.create(&input).await?;
        summary.created += 1;
        ids.push((color.name_en, color.id));
    }
    Ok(ids)
}

/// Returns category slugs with ids, and one model id per seeded model in
/// file order.
async fn seed_categories(
    pool: &SqlitePool,
    seeds: &[CategorySeed],
    summary: &mut SeedSummary,
) -> Result<(Vec<(String, CategoryId)>, Vec<ModelId>), SeedError> {
    let categories = CategoryRepository::new(pool);
    let models = ProductModelRepository::new(pool);
    let mut category_ids: Vec<(String, CategoryId)> = categories
        .list()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();
    let mut model_ids = Vec::new();

    for (index, seed) in seeds.iter().enumerate() {
        let slug = seed
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&seed.name_en));
        let category_id = if let Some(id) = lookup(&category_ids, &slug) {
            summary.existing += 1;
            id
        } else {
            let input = CategoryInput {
                name_en: seed.name_en.clone(),
                name_fa: seed.name_fa.clone(),
                slug: Some(slug),
                display_order: display_order(index),
            }
            .validated()
            .map_err(invalid(&seed.name_en))?;
            let category = categories.create(&input).await?;
            summary.created += 1;
            category_ids.push((category.slug, category.id));
            category.id
        };

        let existing: Vec<(String, ModelId)> = models
            .list(Some(category_id), true)
            .await?
            .into_iter()
            .map(|m| (m.name_en, m.id))
            .collect();
        for (model_index, model) in seed.models.iter().enumerate() {
            if let Some(id) = lookup(&existing, &model.name_en) {
                summary.existing += 1;
                model_ids.push(id);
                continue;
            }
            let input = ProductModelInput {
                category_id,
                name_en: model.name_en.clone(),
                name_fa: model.name_fa.clone(),
                generation: model.generation.clone(),
                image_url: model.image_url.clone(),
                display_order: display_order(model_index),
                is_active: true,
            }
            .validated()
            .map_err(invalid(&model.name_en))?;
            model_ids.push(models.create(&input).await?.id);
            summary.created += 1;
        }
    }
    Ok((category_ids, model_ids))
}

async fn seed_storage(
    pool: &SqlitePool,
    seeds: &[StorageSeed],
    category_ids: &[(String, CategoryId)],
    summary: &mut SeedSummary,
) -> Result<Vec<(String, StorageId)>, SeedError> {
    let repo = StorageOptionRepository::new(pool);
    let mut ids: Vec<(String, StorageId)> = repo
        .list(None, None)
        .await?
        .into_iter()
        .map(|s| (s.name_en, s.id))
        .collect();

    for (index, seed) in seeds.iter().enumerate() {
        if lookup(&ids, &seed.name_en).is_some() {
            summary.existing += 1;
            continue;
        }
        let category_id = match &seed.category {
            Some(slug) => Some(lookup(category_ids, slug).ok_or_else(|| {
                SeedError::UnknownReference(format!(
                    "{}: unknown category '{slug}'",
                    seed.name_en
                ))
            })?),
            None => None,
        };
        let input = StorageOptionInput {
            name_en: seed.name_en.clone(),
            name_fa: seed.name_fa.clone(),
            category_id,
            display_order: display_order(index),
        }
        .validated()
        .map_err(invalid(&seed.name_en))?;
        let option = repo.create(&input).await?;
        summary.created += 1;
        ids.push((option.name_en, option.id));
    }
    Ok(ids)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use sib_store_storefront::db;
    use sib_store_storefront::models::catalog::PriceFilter;

    use super::*;

    const SEED: &str = r##"
colors:
  - nameEn: Black Titanium
    nameFa: مشکی
    hexCode: "#3c3c3d"
  - nameEn: White Titanium
    nameFa: سفید
    hexCode: "#F2F1ED"
storageOptions:
  - nameEn: 256GB
    nameFa: ۲۵۶ گیگابایت
  - nameEn: 1TB
    nameFa: ۱ ترابایت
    category: iphone
categories:
  - nameEn: iPhone
    nameFa: آیفون
    models:
      - nameEn: iPhone 16 Pro
        nameFa: آیفون ۱۶ پرو
        prices:
          - { color: Black Titanium, storage: 256GB, price: 90000000, stock: 2 }
          - { color: white titanium, storage: 1TB, price: 120000000 }
  - nameEn: Apple Watch
    nameFa: اپل واچ
"##;

    async fn pool() -> SqlitePool {
        let pool = db::create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let pool = pool().await;
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();

        let first = catalog(&pool, &seed).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                created: 7,
                existing: 0,
                prices_created: 2,
                prices_updated: 0,
            }
        );

        let second = catalog(&pool, &seed).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 7);
        assert_eq!(second.prices_updated, 2);

        let categories = CategoryRepository::new(&pool).list().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().any(|c| c.slug == "apple-watch"));

        let prices = PriceRepository::new(&pool)
            .list(&PriceFilter::default())
            .await
            .unwrap();
        assert_eq!(prices.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_color_is_reported() {
        let pool = pool().await;
        let seed: CatalogSeed = serde_yaml::from_str(
            r"
categories:
  - nameEn: iPad
    nameFa: آیپد
    models:
      - nameEn: iPad Air
        nameFa: آیپد ایر
        prices:
          - { color: Purple, storage: 128GB, price: 40000000 }
",
        )
        .unwrap();

        let err = catalog(&pool, &seed).await.unwrap_err();
        assert_eq!(err.to_string(), "iPad Air: unknown color 'Purple'");
    }

    #[tokio::test]
    async fn test_bundled_seed_applies() {
        let pool = pool().await;
        let seed: CatalogSeed =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        let summary = catalog(&pool, &seed).await.unwrap();
        assert_eq!(summary.prices_created, 10);
        assert_eq!(summary.existing, 0);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_yaml::from_str::<CatalogSeed>("colours: []");
        assert!(result.is_err());
    }
}
