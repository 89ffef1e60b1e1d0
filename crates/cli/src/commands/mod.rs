//! Subcommand implementations.

pub mod import;
pub mod migrate;
pub mod password;
pub mod seed;

use secrecy::SecretString;
use sqlx::SqlitePool;

use sib_store_storefront::db;

/// Database used when neither `--database-url` nor the environment names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://sib-store.db";

/// Resolve the database URL: explicit flag, then `STORE_DATABASE_URL`, then
/// `DATABASE_URL`.
#[must_use]
pub fn database_url(flag: Option<String>) -> SecretString {
    dotenvy::dotenv().ok();
    let url = flag
        .or_else(|| std::env::var("STORE_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    SecretString::from(url)
}

/// Connect and bring the schema up to date.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect(database_url: &SecretString) -> Result<SqlitePool, Box<dyn std::error::Error>> {
    let pool = db::create_pool(database_url).await?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}
