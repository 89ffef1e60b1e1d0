//! Page visits and client-side error reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sib_store_core::{ErrorLogId, VisitId};

use super::{ValidationError, optional_text, required_text};

const MAX_PATH_CHARS: usize = 2048;
const MAX_MESSAGE_CHARS: usize = 4000;
const MAX_STACK_CHARS: usize = 20_000;

/// A recorded page view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: VisitId,
    pub path: String,
    pub referrer: Option<String>,
    pub visitor_id: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/visits`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitInput {
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub visitor_id: Option<String>,
}

/// A visit ready to be stored.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub path: String,
    pub referrer: Option<String>,
    pub visitor_id: Option<String>,
    pub user_agent: Option<String>,
}

impl VisitInput {
    /// Validate and attach the request's user agent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the path is blank or absurdly long.
    pub fn validated(self, user_agent: Option<String>) -> Result<NewVisit, ValidationError> {
        let path = required_text("path", &self.path)?;
        if path.chars().count() > MAX_PATH_CHARS {
            return Err(ValidationError::new("path is too long"));
        }
        Ok(NewVisit {
            path,
            referrer: optional_text(self.referrer.as_deref()).map(|r| truncate(&r, MAX_PATH_CHARS)),
            visitor_id: optional_text(self.visitor_id.as_deref()).map(|v| truncate(&v, 128)),
            user_agent: user_agent.map(|ua| truncate(&ua, 512)),
        })
    }
}

/// Aggregated visit statistics for the admin dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisitStats {
    pub total_visits: i64,
    pub today_visits: i64,
    pub week_visits: i64,
    /// Distinct visitor ids over all time.
    pub unique_visitors: i64,
    pub top_pages: Vec<PageCount>,
    /// One entry per day for the last 7 days, oldest first, zero-filled.
    pub daily: Vec<DailyCount>,
}

/// Visit count for one path.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageCount {
    pub path: String,
    pub count: i64,
}

/// Visit count for one UTC day.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// A client-side error report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLog {
    pub id: ErrorLogId,
    pub message: String,
    pub stack: Option<String>,
    pub path: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/error-logs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogInput {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// An error report ready to be stored.
#[derive(Debug, Clone)]
pub struct NewErrorLog {
    pub message: String,
    pub stack: Option<String>,
    pub path: Option<String>,
    pub user_agent: Option<String>,
}

impl ErrorLogInput {
    /// Validate, truncating oversized fields instead of rejecting them.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the message is blank.
    pub fn validated(self, user_agent: Option<String>) -> Result<NewErrorLog, ValidationError> {
        let message = required_text("message", &self.message)?;
        Ok(NewErrorLog {
            message: truncate(&message, MAX_MESSAGE_CHARS),
            stack: optional_text(self.stack.as_deref()).map(|s| truncate(&s, MAX_STACK_CHARS)),
            path: optional_text(self.path.as_deref()).map(|p| truncate(&p, MAX_PATH_CHARS)),
            user_agent: user_agent.map(|ua| truncate(&ua, 512)),
        })
    }
}

/// Query parameters for `GET /api/error-logs`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ErrorLogQuery {
    pub limit: Option<i64>,
}

impl ErrorLogQuery {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    /// The requested limit clamped to `1..=500`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
