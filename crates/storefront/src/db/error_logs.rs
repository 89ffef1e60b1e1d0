//! Client error report repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use sib_store_core::ErrorLogId;

use super::RepositoryError;
use crate::models::analytics::{ErrorLog, NewErrorLog};

#[derive(Debug, sqlx::FromRow)]
struct ErrorLogRow {
    id: i64,
    message: String,
    stack: Option<String>,
    path: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ErrorLogRow> for ErrorLog {
    fn from(row: ErrorLogRow) -> Self {
        Self {
            id: ErrorLogId::new(row.id),
            message: row.message,
            stack: row.stack,
            path: row.path,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

/// Repository for client-side error reports.
pub struct ErrorLogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ErrorLogRepository<'a> {
    /// Create a new error log repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a report.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, log: &NewErrorLog) -> Result<ErrorLog, RepositoryError> {
        let row = sqlx::query_as::<_, ErrorLogRow>(
            "INSERT INTO error_logs (message, stack, path, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, message, stack, path, user_agent, created_at",
        )
        .bind(&log.message)
        .bind(&log.stack)
        .bind(&log.path)
        .bind(&log.user_agent)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// The most recent reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<ErrorLog>, RepositoryError> {
        let rows = sqlx::query_as::<_, ErrorLogRow>(
            "SELECT id, message, stack, path, user_agent, created_at
             FROM error_logs
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ErrorLog::from).collect())
    }

    /// Delete every report, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM error_logs")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    fn report(message: &str) -> NewErrorLog {
        NewErrorLog {
            message: message.to_string(),
            stack: None,
            path: Some("/checkout".to_string()),
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_list_limit_and_clear() {
        let pool = test_support::pool().await;
        let repo = ErrorLogRepository::new(&pool);

        for n in 0..3 {
            repo.create(&report(&format!("TypeError {n}"))).await.unwrap();
        }

        let latest = repo.list(2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].message, "TypeError 2");

        assert_eq!(repo.clear().await.unwrap(), 3);
        assert!(repo.list(10).await.unwrap().is_empty());
    }
}
