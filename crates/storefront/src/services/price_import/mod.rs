//! Bulk price import from a CSV spreadsheet.
//!
//! Admins maintain prices in a spreadsheet with one row per
//! (model, color, storage). Headers and cells may be English or Persian;
//! cells are matched against the catalog through the alias dictionaries in
//! [`aliases`]. Rows are processed one at a time and a bad row never aborts
//! the import.

mod aliases;

use std::collections::HashMap;
use std::fmt;

use csv::StringRecord;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use sib_store_core::text::{normalize, to_ascii_digits};
use sib_store_core::{CategoryId, ColorId, ModelId, Price, PriceError, StorageId};

use crate::db::{
    ColorRepository, PriceRepository, ProductModelRepository, RepositoryError,
    StorageOptionRepository, UpsertOutcome,
};
use crate::models::catalog::{PriceFilter, ProductPriceInput};

pub use aliases::{color_key, model_key, storage_key};

/// At most this many row errors are reported back.
pub const MAX_REPORTED_ERRORS: usize = 10;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const MODEL_HEADERS: &[&str] = &["model", "model name", "مدل", "نام مدل"];
const COLOR_HEADERS: &[&str] = &["color", "colour", "رنگ"];
const STORAGE_HEADERS: &[&str] = &["storage", "capacity", "حافظه", "ظرفیت"];
const PRICE_HEADERS: &[&str] = &["price", "قیمت"];
const STOCK_HEADERS: &[&str] = &["stock", "quantity", "موجودی", "تعداد"];

/// Errors that reject the whole file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("the file is empty")]
    Empty,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error("could not load the catalog: {0}")]
    Database(#[from] RepositoryError),
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,
    pub success_count: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub error_count: usize,
    /// The first few failures, formatted as `Row N: reason`.
    pub errors: Vec<String>,
}

impl ImportSummary {
    fn record_error(&mut self, row: usize, reason: &RowError) {
        self.error_count += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(format!("Row {row}: {reason}"));
        }
    }

    fn record_success(&mut self, outcome: UpsertOutcome) {
        self.success_count += 1;
        match outcome {
            UpsertOutcome::Created => self.created_count += 1,
            UpsertOutcome::Updated => self.updated_count += 1,
        }
    }
}

#[derive(Debug, Error)]
enum RowError {
    #[error("malformed row ({0})")]
    Malformed(csv::Error),
    #[error("missing {0}")]
    MissingValue(&'static str),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("unknown color '{0}'")]
    UnknownColor(String),
    #[error("unknown storage '{0}'")]
    UnknownStorage(String),
    #[error("invalid price '{0}' ({1})")]
    InvalidPrice(String, PriceError),
    #[error("invalid stock '{0}'")]
    InvalidStock(String),
    #[error("could not save price")]
    Save,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    model: usize,
    color: usize,
    storage: usize,
    price: usize,
    stock: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ImportError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| normalize(h.trim_start_matches('\u{feff}')))
            .collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));

        let (model, color, storage, price) = (
            find(MODEL_HEADERS),
            find(COLOR_HEADERS),
            find(STORAGE_HEADERS),
            find(PRICE_HEADERS),
        );

        let missing: Vec<&'static str> = [
            ("model", model),
            ("color", color),
            ("storage", storage),
            ("price", price),
        ]
        .into_iter()
        .filter(|(_, position)| position.is_none())
        .map(|(name, _)| name)
        .collect();

        match (model, color, storage, price) {
            (Some(model), Some(color), Some(storage), Some(price)) => Ok(Self {
                model,
                color,
                storage,
                price,
                stock: find(STOCK_HEADERS),
            }),
            _ => Err(ImportError::MissingColumns(missing)),
        }
    }
}

type Triple = (ModelId, ColorId, StorageId);

/// Catalog lookup tables, loaded once per import.
struct Catalog {
    models: HashMap<String, (ModelId, CategoryId)>,
    colors: HashMap<String, ColorId>,
    /// Keyed by the option's category restriction (`None` for any category).
    storages: HashMap<(Option<CategoryId>, String), StorageId>,
    stock: HashMap<Triple, i64>,
}

impl Catalog {
    async fn load(pool: &SqlitePool) -> Result<Self, RepositoryError> {
        let mut models = HashMap::new();
        for model in ProductModelRepository::new(pool).list(None, true).await? {
            for name in [&model.name_en, &model.name_fa] {
                models
                    .entry(model_key(name))
                    .or_insert((model.id, model.category_id));
            }
        }

        let color_list = ColorRepository::new(pool).list(None).await?;
        let mut colors = HashMap::new();
        for color in &color_list {
            for key in [normalize(&color.name_fa), normalize(&color.name_en)] {
                colors.entry(key).or_insert(color.id);
            }
        }
        // Alias keys never shadow a stored name, and an alias claimed by two
        // colors is left out.
        let mut aliases: HashMap<String, Option<ColorId>> = HashMap::new();
        for color in &color_list {
            let key = color_key(&color.name_en);
            if colors.contains_key(&key) {
                continue;
            }
            aliases
                .entry(key)
                .and_modify(|claim| {
                    if *claim != Some(color.id) {
                        *claim = None;
                    }
                })
                .or_insert(Some(color.id));
        }
        colors.extend(
            aliases
                .into_iter()
                .filter_map(|(key, claim)| claim.map(|id| (key, id))),
        );

        let mut storages = HashMap::new();
        for storage in StorageOptionRepository::new(pool).list(None, None).await? {
            for name in [&storage.name_en, &storage.name_fa] {
                storages
                    .entry((storage.category_id, storage_key(name)))
                    .or_insert(storage.id);
            }
        }

        let filter = PriceFilter {
            include_inactive: true,
            ..PriceFilter::default()
        };
        let stock = PriceRepository::new(pool)
            .list(&filter)
            .await?
            .into_iter()
            .map(|p| ((p.model_id, p.color_id, p.storage_id), p.stock))
            .collect();

        Ok(Self {
            models,
            colors,
            storages,
            stock,
        })
    }

    /// Turn one data row into a price upsert.
    fn resolve(&self, columns: Columns, record: &StringRecord) -> Result<ProductPriceInput, RowError> {
        let cell = |index: usize, name: &'static str| {
            record
                .get(index)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or(RowError::MissingValue(name))
        };

        let model = cell(columns.model, "model")?;
        let (model_id, category_id) = *self
            .models
            .get(&model_key(model))
            .ok_or_else(|| RowError::UnknownModel(model.to_owned()))?;

        let color = cell(columns.color, "color")?;
        let color_id = *self
            .colors
            .get(&normalize(color))
            .or_else(|| self.colors.get(&color_key(color)))
            .ok_or_else(|| RowError::UnknownColor(color.to_owned()))?;

        let storage = cell(columns.storage, "storage")?;
        let key = storage_key(storage);
        let storage_id = *self
            .storages
            .get(&(Some(category_id), key.clone()))
            .or_else(|| self.storages.get(&(None, key)))
            .ok_or_else(|| RowError::UnknownStorage(storage.to_owned()))?;

        let raw_price = cell(columns.price, "price")?;
        let price = Price::parse(raw_price)
            .map_err(|e| RowError::InvalidPrice(raw_price.to_owned(), e))?;

        let stock = match columns.stock.and_then(|i| record.get(i)).map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_stock(raw)?,
            _ => self
                .stock
                .get(&(model_id, color_id, storage_id))
                .copied()
                .unwrap_or(0),
        };

        Ok(ProductPriceInput {
            model_id,
            color_id,
            storage_id,
            price: price.toman(),
            stock,
            is_active: true,
        })
    }
}

fn parse_stock(raw: &str) -> Result<i64, RowError> {
    to_ascii_digits(raw)
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| RowError::InvalidStock(raw.to_owned()))
}

/// Spreadsheet row number of a record, counting the header as row 1.
fn row_number(position: Option<&csv::Position>, fallback: usize) -> usize {
    position
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(fallback)
}

/// Import prices from CSV bytes.
///
/// Every row that resolves is upserted with `is_active = true`. A missing
/// stock column or blank stock cell keeps the existing stock (0 for new
/// rows). Callers holding a [`CatalogCache`](super::catalog::CatalogCache)
/// must invalidate it afterwards.
///
/// # Errors
///
/// Returns `ImportError` when the header row cannot be read, a required
/// column is missing, or the catalog lookup tables cannot be loaded.
/// Failures in individual rows are reported in the summary instead.
#[instrument(skip(pool, data), fields(bytes = data.len()))]
pub async fn import_prices(pool: &SqlitePool, data: &[u8]) -> Result<ImportSummary, ImportError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty);
    }
    let columns = Columns::from_headers(&headers)?;
    let records: Vec<Result<StringRecord, csv::Error>> = reader.records().collect();

    let catalog = Catalog::load(pool).await?;
    let prices = PriceRepository::new(pool);
    let mut summary = ImportSummary::default();

    for (index, record) in records.into_iter().enumerate() {
        let fallback_row = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let row = row_number(e.position(), fallback_row);
                summary.total_rows += 1;
                summary.record_error(row, &RowError::Malformed(e));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row = row_number(record.position(), fallback_row);
        summary.total_rows += 1;

        let input = match catalog.resolve(columns, &record) {
            Ok(input) => input,
            Err(reason) => {
                summary.record_error(row, &reason);
                continue;
            }
        };

        match prices.upsert(&input).await {
            Ok((_, outcome)) => summary.record_success(outcome),
            Err(e) => {
                warn!(row, error = %e, "Failed to save imported price");
                summary.record_error(row, &RowError::Save);
            }
        }
    }

    info!(
        total = summary.total_rows,
        created = summary.created_count,
        updated = summary.updated_count,
        failed = summary.error_count,
        "Price import finished"
    );
    Ok(summary)
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} created, {} updated, {} failed",
            self.total_rows, self.created_count, self.updated_count, self.error_count
        )
    }
}
