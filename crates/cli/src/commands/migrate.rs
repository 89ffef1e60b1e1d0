//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sib-cli migrate
//! sib-cli --database-url sqlite://data/store.db migrate
//! ```
//!
//! Migrations are embedded from `crates/storefront/migrations/`; the server
//! applies the same set on start.

use secrecy::SecretString;
use sqlx::migrate::MigrateError;
use thiserror::Error;

use sib_store_storefront::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Apply pending migrations and report how many ran.
///
/// # Errors
///
/// Returns `MigrationError` if the connection or a migration fails.
pub async fn run(database_url: &SecretString) -> Result<usize, MigrationError> {
    tracing::info!("Connecting to store database...");
    let pool = db::create_pool(database_url).await?;

    let applied_before: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name = '_sqlx_migrations'")
            .fetch_one(&pool)
            .await?;
    let before = if applied_before > 0 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations")
            .fetch_one(&pool)
            .await?
    } else {
        0
    };

    tracing::info!("Running store migrations...");
    db::run_migrations(&pool).await?;

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(&pool)
        .await?;
    let applied = usize::try_from(after - before).unwrap_or_default();

    tracing::info!(applied, "Store migrations complete");
    Ok(applied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_migrations_apply() {
        let applied = run(&SecretString::from("sqlite::memory:")).await.unwrap();
        assert_eq!(applied, db::MIGRATOR.iter().count());
    }
}
