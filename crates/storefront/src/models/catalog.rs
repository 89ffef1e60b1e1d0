//! Catalog models: categories, models, colors, storage options and prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sib_store_core::{
    CategoryId, ColorId, ModelId, Price, PriceId, StorageId, text::normalize,
};

use super::{ValidationError, double_option, optional_text, required_text};

const fn default_true() -> bool {
    true
}

// =============================================================================
// Category
// =============================================================================

/// A top-level product family (iPhone, iPad, `MacBook`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name_en: String,
    pub name_fa: String,
    pub slug: String,
    pub display_order: i64,
}

/// Fields for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name_en: String,
    pub name_fa: String,
    /// Derived from `name_en` when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

impl CategoryInput {
    /// Trim names and settle the slug.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a name is blank or the slug contains
    /// anything other than lowercase ASCII letters, digits and hyphens.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name_en = required_text("nameEn", &self.name_en)?;
        let name_fa = required_text("nameFa", &self.name_fa)?;
        let slug = match optional_text(self.slug.as_deref()) {
            Some(slug) => slug,
            None => slugify(&name_en),
        };

        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::new(
                "slug must contain only lowercase letters, digits and hyphens",
            ));
        }

        Ok(Self {
            name_en,
            name_fa,
            slug: Some(slug),
            display_order: self.display_order,
        })
    }

    /// The slug after validation.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or_default()
    }
}

/// Partial category update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name_en: Option<String>,
    pub name_fa: Option<String>,
    pub slug: Option<String>,
    pub display_order: Option<i64>,
}

impl CategoryPatch {
    /// Merge onto an existing category and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged category is invalid.
    pub fn apply(self, existing: Category) -> Result<CategoryInput, ValidationError> {
        CategoryInput {
            name_en: self.name_en.unwrap_or(existing.name_en),
            name_fa: self.name_fa.unwrap_or(existing.name_fa),
            slug: Some(self.slug.unwrap_or(existing.slug)),
            display_order: self.display_order.unwrap_or(existing.display_order),
        }
        .validated()
    }
}

/// Lowercase ASCII slug from an English name (`"Apple Watch"` → `apple-watch`).
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_owned()
}

// =============================================================================
// Product model
// =============================================================================

/// A concrete device, e.g. "iPhone 16 Pro Max".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductModel {
    pub id: ModelId,
    pub category_id: CategoryId,
    pub name_en: String,
    pub name_fa: String,
    pub generation: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
}

impl ProductModel {
    /// Whether `key` names this model in either language.
    ///
    /// `key` must already be normalized; hyphens are read as spaces and
    /// spacing is ignored, so `iphone-16-pro` and `iPhone16Pro` both match.
    #[must_use]
    pub fn matches_name(&self, key: &str) -> bool {
        let key = key.replace(' ', "");
        [&self.name_en, &self.name_fa]
            .into_iter()
            .any(|name| normalize(&name.replace('-', " ")).replace(' ', "") == key)
    }
}

/// Fields for creating or replacing a model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductModelInput {
    pub category_id: CategoryId,
    pub name_en: String,
    pub name_fa: String,
    #[serde(default)]
    pub generation: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductModelInput {
    /// Trim text fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a name is blank or the image URL is not
    /// an absolute http(s) URL.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let image_url = optional_text(self.image_url.as_deref());
        if let Some(url) = &image_url {
            let parsed = url::Url::parse(url)
                .map_err(|_| ValidationError::new("imageUrl must be an absolute URL"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::new("imageUrl must use http or https"));
            }
        }

        Ok(Self {
            category_id: self.category_id,
            name_en: required_text("nameEn", &self.name_en)?,
            name_fa: required_text("nameFa", &self.name_fa)?,
            generation: optional_text(self.generation.as_deref()),
            image_url,
            display_order: self.display_order,
            is_active: self.is_active,
        })
    }
}

/// Partial model update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductModelPatch {
    pub category_id: Option<CategoryId>,
    pub name_en: Option<String>,
    pub name_fa: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub generation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub display_order: Option<i64>,
    pub is_active: Option<bool>,
}

impl ProductModelPatch {
    /// Merge onto an existing model and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged model is invalid.
    pub fn apply(self, existing: ProductModel) -> Result<ProductModelInput, ValidationError> {
        ProductModelInput {
            category_id: self.category_id.unwrap_or(existing.category_id),
            name_en: self.name_en.unwrap_or(existing.name_en),
            name_fa: self.name_fa.unwrap_or(existing.name_fa),
            generation: self.generation.unwrap_or(existing.generation),
            image_url: self.image_url.unwrap_or(existing.image_url),
            display_order: self.display_order.unwrap_or(existing.display_order),
            is_active: self.is_active.unwrap_or(existing.is_active),
        }
        .validated()
    }
}

// =============================================================================
// Color
// =============================================================================

/// A finish, e.g. "Desert Titanium" / "صحرایی".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: ColorId,
    pub name_en: String,
    pub name_fa: String,
    pub hex_code: String,
    pub display_order: i64,
}

/// Fields for creating or replacing a color.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorInput {
    pub name_en: String,
    pub name_fa: String,
    pub hex_code: String,
    #[serde(default)]
    pub display_order: i64,
}

impl ColorInput {
    /// Trim names and canonicalize the hex code to uppercase `#RRGGBB`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a name is blank or the hex code is malformed.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name_en: required_text("nameEn", &self.name_en)?,
            name_fa: required_text("nameFa", &self.name_fa)?,
            hex_code: parse_hex_code(&self.hex_code)?,
            display_order: self.display_order,
        })
    }
}

/// Partial color update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPatch {
    pub name_en: Option<String>,
    pub name_fa: Option<String>,
    pub hex_code: Option<String>,
    pub display_order: Option<i64>,
}

impl ColorPatch {
    /// Merge onto an existing color and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged color is invalid.
    pub fn apply(self, existing: Color) -> Result<ColorInput, ValidationError> {
        ColorInput {
            name_en: self.name_en.unwrap_or(existing.name_en),
            name_fa: self.name_fa.unwrap_or(existing.name_fa),
            hex_code: self.hex_code.unwrap_or(existing.hex_code),
            display_order: self.display_order.unwrap_or(existing.display_order),
        }
        .validated()
    }
}

fn parse_hex_code(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("hexCode must look like #RRGGBB"));
    }
    Ok(format!("#{}", digits.to_ascii_uppercase()))
}

// =============================================================================
// Storage option
// =============================================================================

/// A capacity or configuration, e.g. "256GB" or "16GB/512GB".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageOption {
    pub id: StorageId,
    pub name_en: String,
    pub name_fa: String,
    /// Restricts the option to one category; `None` means any.
    pub category_id: Option<CategoryId>,
    pub display_order: i64,
}

/// Fields for creating or replacing a storage option.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptionInput {
    pub name_en: String,
    pub name_fa: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub display_order: i64,
}

impl StorageOptionInput {
    /// Trim names.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a name is blank.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name_en: required_text("nameEn", &self.name_en)?,
            name_fa: required_text("nameFa", &self.name_fa)?,
            category_id: self.category_id,
            display_order: self.display_order,
        })
    }
}

/// Partial storage option update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptionPatch {
    pub name_en: Option<String>,
    pub name_fa: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<CategoryId>>,
    pub display_order: Option<i64>,
}

impl StorageOptionPatch {
    /// Merge onto an existing storage option and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged option is invalid.
    pub fn apply(self, existing: StorageOption) -> Result<StorageOptionInput, ValidationError> {
        StorageOptionInput {
            name_en: self.name_en.unwrap_or(existing.name_en),
            name_fa: self.name_fa.unwrap_or(existing.name_fa),
            category_id: self.category_id.unwrap_or(existing.category_id),
            display_order: self.display_order.unwrap_or(existing.display_order),
        }
        .validated()
    }
}

// =============================================================================
// Product price
// =============================================================================

/// The price of one (model, color, storage) combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrice {
    pub id: PriceId,
    pub model_id: ModelId,
    pub color_id: ColorId,
    pub storage_id: StorageId,
    pub price: Price,
    pub stock: i64,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating (upserting) or replacing a price row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceInput {
    pub model_id: ModelId,
    pub color_id: ColorId,
    pub storage_id: StorageId,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductPriceInput {
    /// Check the amount and stock.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the price is not positive or stock is negative.
    pub fn validated(self) -> Result<Self, ValidationError> {
        Price::new(self.price).map_err(|e| ValidationError(e.to_string()))?;
        if self.stock < 0 {
            return Err(ValidationError::new("stock cannot be negative"));
        }
        Ok(self)
    }
}

/// Partial price update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricePatch {
    pub price: Option<i64>,
    pub stock: Option<i64>,
    pub is_active: Option<bool>,
}

impl ProductPricePatch {
    /// Merge onto an existing price row and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the merged row is invalid.
    pub fn apply(self, existing: ProductPrice) -> Result<ProductPriceInput, ValidationError> {
        ProductPriceInput {
            model_id: existing.model_id,
            color_id: existing.color_id,
            storage_id: existing.storage_id,
            price: self.price.unwrap_or_else(|| existing.price.toman()),
            stock: self.stock.unwrap_or(existing.stock),
            is_active: self.is_active.unwrap_or(existing.is_active),
        }
        .validated()
    }
}

/// Filters for listing price rows.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    pub model_id: Option<ModelId>,
    pub color_id: Option<ColorId>,
    pub storage_id: Option<StorageId>,
    /// Admin-only; ignored for anonymous callers.
    #[serde(default)]
    pub include_inactive: bool,
}

// =============================================================================
// Product details
// =============================================================================

/// Everything the purchase wizard needs for one model.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub model: ProductModel,
    pub category: Category,
    pub storage_options: Vec<StorageWithColors>,
}

/// A storage option and the colors priced for it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageWithColors {
    pub storage: StorageOption,
    pub colors: Vec<ColorPrice>,
}

/// One priced color under a storage option.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColorPrice {
    pub color: Color,
    pub price: Price,
    pub stock: i64,
    pub price_id: PriceId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Apple Watch"), "apple-watch");
        assert_eq!(slugify("  iPad / Air "), "ipad-air");
        assert_eq!(slugify("آیفون"), "");
    }

    #[test]
    fn test_category_requires_ascii_slug_for_persian_names() {
        let input = CategoryInput {
            name_en: "آیفون".to_string(),
            name_fa: "آیفون".to_string(),
            slug: None,
            display_order: 0,
        };
        assert!(input.validated().is_err());
    }

    #[test]
    fn test_category_slug_derived() {
        let input = CategoryInput {
            name_en: " AirPods ".to_string(),
            name_fa: "ایرپاد".to_string(),
            slug: None,
            display_order: 3,
        }
        .validated()
        .unwrap();
        assert_eq!(input.name_en, "AirPods");
        assert_eq!(input.slug(), "airpods");
    }

    #[test]
    fn test_hex_code() {
        assert_eq!(parse_hex_code("#ffcc00").unwrap(), "#FFCC00");
        assert_eq!(parse_hex_code("a1b2c3").unwrap(), "#A1B2C3");
        assert!(parse_hex_code("#fff").is_err());
        assert!(parse_hex_code("#GGGGGG").is_err());
    }

    #[test]
    fn test_price_input_validation() {
        let input = ProductPriceInput {
            model_id: ModelId::new(1),
            color_id: ColorId::new(1),
            storage_id: StorageId::new(1),
            price: 0,
            stock: 0,
            is_active: true,
        };
        assert!(input.clone().validated().is_err());
        assert!(
            ProductPriceInput {
                price: 10,
                stock: -1,
                ..input.clone()
            }
            .validated()
            .is_err()
        );
        assert!(ProductPriceInput { price: 10, ..input }.validated().is_ok());
    }

    #[test]
    fn test_model_patch_can_clear_generation() {
        let existing = ProductModel {
            id: ModelId::new(1),
            category_id: CategoryId::new(1),
            name_en: "iPhone 16".to_string(),
            name_fa: "آیفون ۱۶".to_string(),
            generation: Some("2024".to_string()),
            image_url: None,
            display_order: 0,
            is_active: true,
        };
        let patch: ProductModelPatch = serde_json::from_str(r#"{"generation": null}"#).unwrap();
        let merged = patch.apply(existing.clone()).unwrap();
        assert_eq!(merged.generation, None);

        let patch: ProductModelPatch = serde_json::from_str(r#"{"nameEn": "iPhone 16e"}"#).unwrap();
        let merged = patch.apply(existing).unwrap();
        assert_eq!(merged.generation.as_deref(), Some("2024"));
        assert_eq!(merged.name_en, "iPhone 16e");
    }

    #[test]
    fn test_model_matches_name() {
        let model = ProductModel {
            id: ModelId::new(1),
            category_id: CategoryId::new(1),
            name_en: "iPhone 16 Pro Max".to_string(),
            name_fa: "آیفون ۱۶ پرو مکس".to_string(),
            generation: None,
            image_url: None,
            display_order: 0,
            is_active: true,
        };
        assert!(model.matches_name(&normalize("iphone 16 pro max")));
        assert!(model.matches_name(&normalize("IPHONE16PROMAX")));
        assert!(model.matches_name(&normalize("آیفون 16 پرو مکس")));
        assert!(!model.matches_name(&normalize("iphone 16 pro")));
    }
}
