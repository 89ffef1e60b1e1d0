//! Import prices from a CSV file on disk.
//!
//! Uses the same importer as `POST /api/product-prices/import`, so the file
//! format and alias matching are identical. A running server caches catalog
//! reads for a few minutes; imported prices appear once that cache expires.

use std::path::Path;

use sqlx::SqlitePool;
use tracing::{info, warn};

use sib_store_storefront::services::price_import::{ImportSummary, import_prices};

/// Import a CSV file and log the outcome.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the importer rejects it as
/// a whole. Bad rows are logged, not returned.
pub async fn prices_from_file(
    pool: &SqlitePool,
    path: &Path,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Importing prices");
    let data = tokio::fs::read(path).await?;
    let summary = import_prices(pool, &data).await?;

    info!(%summary, "Import complete");
    for error in &summary.errors {
        warn!("  {error}");
    }
    if summary.error_count > summary.errors.len() {
        warn!(
            "  ... and {} more",
            summary.error_count - summary.errors.len()
        );
    }
    Ok(summary)
}
