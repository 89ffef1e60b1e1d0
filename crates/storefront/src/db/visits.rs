//! Page visit repository.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::SqlitePool;

use sib_store_core::VisitId;

use super::RepositoryError;
use crate::models::analytics::{DailyCount, NewVisit, PageCount, Visit, VisitStats};

/// Number of paths reported in `VisitStats::top_pages`.
const TOP_PAGES: i64 = 10;

/// Number of days covered by `VisitStats::daily`.
const DAILY_WINDOW: u64 = 7;

#[derive(Debug, sqlx::FromRow)]
struct VisitRow {
    id: i64,
    path: String,
    referrer: Option<String>,
    visitor_id: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Self {
            id: VisitId::new(row.id),
            path: row.path,
            referrer: row.referrer,
            visitor_id: row.visitor_id,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    total: i64,
    today: i64,
    week: i64,
    unique_visitors: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct DayRow {
    day: String,
    count: i64,
}

/// Repository for page visits.
pub struct VisitRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VisitRepository<'a> {
    /// Create a new visit repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a visit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, visit: &NewVisit) -> Result<Visit, RepositoryError> {
        self.create_at(visit, Utc::now()).await
    }

    async fn create_at(
        &self,
        visit: &NewVisit,
        at: DateTime<Utc>,
    ) -> Result<Visit, RepositoryError> {
        let row = sqlx::query_as::<_, VisitRow>(
            "INSERT INTO visits (path, referrer, visitor_id, user_agent, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, path, referrer, visitor_id, user_agent, created_at",
        )
        .bind(&visit.path)
        .bind(&visit.referrer)
        .bind(&visit.visitor_id)
        .bind(&visit.user_agent)
        .bind(at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Aggregate statistics as of `now`.
    ///
    /// "Today" is the UTC calendar day of `now`; the week and the daily series
    /// cover the last seven UTC days including today.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<VisitStats, RepositoryError> {
        let today = now.date_naive();
        let window_start = today
            .checked_sub_days(Days::new(DAILY_WINDOW - 1))
            .unwrap_or(today);

        let totals = sqlx::query_as::<_, TotalsRow>(
            "SELECT
                 COUNT(*) AS total,
                 COALESCE(SUM(substr(created_at, 1, 10) = ?1), 0) AS today,
                 COALESCE(SUM(substr(created_at, 1, 10) >= ?2), 0) AS week,
                 COUNT(DISTINCT visitor_id) AS unique_visitors
             FROM visits",
        )
        .bind(day_key(today))
        .bind(day_key(window_start))
        .fetch_one(self.pool)
        .await?;

        let top_pages = sqlx::query_as::<_, (String, i64)>(
            "SELECT path, COUNT(*) AS count
             FROM visits
             GROUP BY path
             ORDER BY count DESC, path
             LIMIT ?",
        )
        .bind(TOP_PAGES)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|(path, count)| PageCount { path, count })
        .collect();

        let days = sqlx::query_as::<_, DayRow>(
            "SELECT substr(created_at, 1, 10) AS day, COUNT(*) AS count
             FROM visits
             WHERE substr(created_at, 1, 10) >= ?
             GROUP BY day",
        )
        .bind(day_key(window_start))
        .fetch_all(self.pool)
        .await?;

        let daily = window_start
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|date| {
                let key = day_key(date);
                let count = days
                    .iter()
                    .find(|row| row.day == key)
                    .map_or(0, |row| row.count);
                DailyCount { date, count }
            })
            .collect();

        Ok(VisitStats {
            total_visits: totals.total,
            today_visits: totals.today,
            week_visits: totals.week,
            unique_visitors: totals.unique_visitors,
            top_pages,
            daily,
        })
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::db::test_support;

    fn visit(path: &str, visitor: Option<&str>) -> NewVisit {
        NewVisit {
            path: path.to_string(),
            referrer: None,
            visitor_id: visitor.map(str::to_string),
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_stats_counts_and_windows() {
        let pool = test_support::pool().await;
        let repo = VisitRepository::new(&pool);
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap();

        repo.create_at(&visit("/", Some("a")), now).await.unwrap();
        repo.create_at(&visit("/", Some("b")), now - Duration::hours(2))
            .await
            .unwrap();
        repo.create_at(&visit("/iphone", Some("a")), now - Duration::days(3))
            .await
            .unwrap();
        repo.create_at(&visit("/used", None), now - Duration::days(30))
            .await
            .unwrap();

        let stats = repo.stats(now).await.unwrap();
        assert_eq!(stats.total_visits, 4);
        assert_eq!(stats.today_visits, 2);
        assert_eq!(stats.week_visits, 3);
        assert_eq!(stats.unique_visitors, 2);
        assert_eq!(stats.top_pages[0], PageCount { path: "/".to_string(), count: 2 });

        assert_eq!(stats.daily.len(), 7);
        assert_eq!(stats.daily[0].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(stats.daily[6].count, 2);
        assert_eq!(stats.daily[3].count, 1);
        assert_eq!(stats.daily.iter().map(|d| d.count).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn test_stats_on_empty_table() {
        let pool = test_support::pool().await;
        let stats = VisitRepository::new(&pool).stats(Utc::now()).await.unwrap();

        assert_eq!(stats.total_visits, 0);
        assert_eq!(stats.today_visits, 0);
        assert!(stats.top_pages.is_empty());
        assert!(stats.daily.iter().all(|d| d.count == 0));
    }
}
