//! Page visits and client-side error reports.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;

use crate::db::{ErrorLogRepository, VisitRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::analytics::{ErrorLog, ErrorLogInput, ErrorLogQuery, VisitInput, VisitStats};
use crate::routes::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Create the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/visits", post(record_visit))
        .route("/visits/stats", get(visit_stats))
        .route(
            "/error-logs",
            post(record_error).get(list_errors).delete(clear_errors),
        )
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
struct Recorded {
    id: i64,
}

/// POST /api/visits
async fn record_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<VisitInput>,
) -> Result<(StatusCode, ApiJson<Recorded>)> {
    let visit = VisitRepository::new(state.pool())
        .create(&input.validated(user_agent(&headers))?)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiJson(Recorded {
            id: visit.id.as_i64(),
        }),
    ))
}

/// GET /api/visits/stats
async fn visit_stats(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiJson<VisitStats>> {
    let stats = VisitRepository::new(state.pool()).stats(Utc::now()).await?;
    Ok(ApiJson(stats))
}

/// POST /api/error-logs
async fn record_error(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<ErrorLogInput>,
) -> Result<(StatusCode, ApiJson<Recorded>)> {
    let log = ErrorLogRepository::new(state.pool())
        .create(&input.validated(user_agent(&headers))?)
        .await?;

    tracing::warn!(
        error_log_id = %log.id,
        path = log.path.as_deref().unwrap_or("-"),
        message = %log.message,
        "Client error reported"
    );
    Ok((
        StatusCode::CREATED,
        ApiJson(Recorded {
            id: log.id.as_i64(),
        }),
    ))
}

/// GET /api/error-logs
async fn list_errors(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ErrorLogQuery>,
) -> Result<ApiJson<Vec<ErrorLog>>> {
    let logs = ErrorLogRepository::new(state.pool())
        .list(query.limit())
        .await?;
    Ok(ApiJson(logs))
}

#[derive(Debug, Serialize)]
struct Cleared {
    deleted: u64,
}

/// DELETE /api/error-logs
async fn clear_errors(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiJson<Cleared>> {
    let deleted = ErrorLogRepository::new(state.pool()).clear().await?;

    tracing::info!(admin = %admin.username, deleted, "Cleared error logs");
    Ok(ApiJson(Cleared { deleted }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, header::CONTENT_TYPE},
    };
    use serde_json::json;

    use super::super::test_support::{TestApp, read_json};
    use super::*;

    #[tokio::test]
    async fn test_visits_and_stats() {
        let app = TestApp::new().await;

        for (path, visitor) in [("/", "a"), ("/", "b"), ("/used-phones", "a")] {
            let request = Request::post("/api/visits")
                .header(CONTENT_TYPE, "application/json")
                .header(USER_AGENT, "Mozilla/5.0 (iPhone)")
                .body(Body::from(
                    json!({ "path": path, "visitorId": visitor }).to_string(),
                ))
                .unwrap();
            let (status, body) = read_json(app.send(request).await).await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(body["id"].is_i64());
        }

        assert_eq!(
            app.get("/api/visits/stats").await.0,
            StatusCode::UNAUTHORIZED
        );

        let cookie = app.login().await;
        let (status, stats) = app
            .call(Method::GET, "/api/visits/stats", None, Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalVisits"], 3);
        assert_eq!(stats["todayVisits"], 3);
        assert_eq!(stats["uniqueVisitors"], 2);
        assert_eq!(stats["topPages"][0]["path"], "/");
        assert_eq!(stats["topPages"][0]["count"], 2);
    }

    #[tokio::test]
    async fn test_error_logs_lifecycle() {
        let app = TestApp::new().await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/error-logs",
                Some(json!({ "message": "TypeError: x is undefined", "path": "/chat" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .call(Method::POST, "/api/error-logs", Some(json!({ "message": " " })), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let cookie = app.login().await;
        let (_, logs) = app
            .call(Method::GET, "/api/error-logs?limit=5", None, Some(&cookie))
            .await;
        assert_eq!(logs.as_array().unwrap().len(), 1);
        assert_eq!(logs[0]["message"], "TypeError: x is undefined");

        let (status, cleared) = app
            .call(Method::DELETE, "/api/error-logs", None, Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared, json!({ "deleted": 1 }));
    }
}
