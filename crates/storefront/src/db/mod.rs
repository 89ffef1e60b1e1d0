//! Database operations for the store's `SQLite` database.
//!
//! ## Tables
//!
//! - `categories`, `product_models`, `colors`, `storage_options` - the catalog
//! - `product_prices` - one row per (model, color, storage), unique
//! - `used_phones` - second-hand listings
//! - `whatsapp_orders`, `apple_id_orders` - customer requests
//! - `visits`, `error_logs` - append-only analytics
//! - `tower_sessions` - admin sessions (created by the session store)
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/`, are embedded at build
//! time, and run on server start or via:
//! ```bash
//! cargo run -p sib-store-cli -- migrate
//! ```

pub mod categories;
pub mod colors;
pub mod error_logs;
pub mod orders;
pub mod prices;
pub mod product_models;
pub mod storage_options;
pub mod used_phones;
pub mod visits;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use categories::CategoryRepository;
pub use colors::ColorRepository;
pub use error_logs::ErrorLogRepository;
pub use orders::{AppleIdOrderRepository, WhatsappOrderRepository};
pub use prices::{PriceRepository, UpsertOutcome};
pub use product_models::ProductModelRepository;
pub use storage_options::StorageOptionRepository;
pub use used_phones::UsedPhoneRepository;
pub use visits::VisitRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g. duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key or check constraint violation.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl RepositoryError {
    /// Classify a write error, naming the entity in conflict messages.
    pub(crate) fn from_write(err: sqlx::Error, entity: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{entity} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(format!("{entity} references a missing record"));
            }
            if db_err.is_check_violation() {
                return Self::InvalidReference(format!("{entity} has an out-of-range value"));
            }
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if missing and foreign keys are enforced on
/// every connection. An in-memory URL (`sqlite::memory:`) gets a single
/// connection that is never recycled, since each new connection would see an
/// empty database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    let pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(10).min_connections(1)
    };

    pool_options.connect_with(options).await
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history does
/// not match the embedded migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use secrecy::SecretString;
    use sqlx::SqlitePool;

    /// A migrated in-memory database.
    #[allow(clippy::unwrap_used)]
    pub async fn pool() -> SqlitePool {
        let pool = super::create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        super::run_migrations(&pool).await.unwrap();
        pool
    }
}
