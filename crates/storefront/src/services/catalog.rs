//! Product-details resolution and the catalog read cache.
//!
//! Product-details lookups and the chat assistant's store summary are read
//! far more often than the catalog changes, so both are cached for 5 minutes
//! with `moka`. Every catalog write and price import calls
//! [`CatalogCache::invalidate_all`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::SqlitePool;
use tracing::debug;

use sib_store_core::text::normalize;

use crate::db::{CategoryRepository, PriceRepository, ProductModelRepository, RepositoryError};
use crate::models::catalog::{ColorPrice, ProductDetails, StorageOption, StorageWithColors};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Normalized model name from the URL.
    ProductDetails(String),
    ChatContext,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ProductDetails(Arc<ProductDetails>),
    ChatContext(Arc<str>),
}

/// Shared cache of catalog reads.
///
/// Readers note [`generation`](Self::generation) before querying and hand it
/// back on insert; a value read across an invalidation is never kept.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
    generation: Arc<AtomicU64>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bumped by every [`invalidate_all`](Self::invalidate_all).
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.cache.get(key).await
    }

    /// Cache a value read while `generation` was current.
    ///
    /// Skipped when the catalog changed since; if it changes while the
    /// value is being written, the entry is dropped again.
    pub(crate) async fn insert(&self, key: CacheKey, value: CacheValue, generation: u64) {
        if self.generation() != generation {
            return;
        }
        self.cache.insert(key.clone(), value).await;
        if self.generation() != generation {
            self.cache.invalidate(&key).await;
        }
    }

    /// Drop every cached entry. Call after any catalog mutation.
    pub async fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

/// Normalize a model name taken from a URL path segment.
///
/// ```
/// use sib_store_storefront::services::catalog::model_key;
///
/// assert_eq!(model_key("iPhone-16-Pro"), "iphone 16 pro");
/// assert_eq!(model_key("آیفون-۱۶"), "آیفون 16");
/// ```
#[must_use]
pub fn model_key(raw: &str) -> String {
    normalize(&raw.replace(['-', '_'], " "))
}

/// Resolve a model by name to its category and priced options.
///
/// Returns `None` for an unknown or inactive model. Combinations without an
/// active price row are simply absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn product_details(
    pool: &SqlitePool,
    cache: &CatalogCache,
    model_name: &str,
) -> Result<Option<Arc<ProductDetails>>, RepositoryError> {
    let key = model_key(model_name);
    if key.is_empty() {
        return Ok(None);
    }

    let cache_key = CacheKey::ProductDetails(key.clone());
    if let Some(CacheValue::ProductDetails(details)) = cache.get(&cache_key).await {
        debug!(model = %key, "Cache hit for product details");
        return Ok(Some(details));
    }

    let generation = cache.generation();
    let models = ProductModelRepository::new(pool).list(None, false).await?;
    let Some(model) = models.into_iter().find(|m| m.matches_name(&key)) else {
        return Ok(None);
    };

    let category = CategoryRepository::new(pool)
        .get(model.category_id)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("model {} has no category", model.id))
        })?;

    let options = PriceRepository::new(pool).priced_options(model.id).await?;

    let details = Arc::new(ProductDetails {
        model,
        category,
        storage_options: group_by_storage(options),
    });
    cache
        .insert(
            cache_key,
            CacheValue::ProductDetails(Arc::clone(&details)),
            generation,
        )
        .await;

    Ok(Some(details))
}

/// Group (storage, color) pairs by storage, keeping the input order.
#[must_use]
pub fn group_by_storage(options: Vec<(StorageOption, ColorPrice)>) -> Vec<StorageWithColors> {
    let mut grouped: Vec<StorageWithColors> = Vec::new();
    for (storage, color) in options {
        match grouped.iter_mut().find(|g| g.storage.id == storage.id) {
            Some(group) => group.colors.push(color),
            None => grouped.push(StorageWithColors {
                storage,
                colors: vec![color],
            }),
        }
    }
    grouped
}
