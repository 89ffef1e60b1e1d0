//! HTTP route handlers for the store API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (pings the database)
//!
//! # Catalog (reads public, writes admin)
//! GET|POST         /api/categories
//! GET|PATCH|DELETE /api/categories/{id}
//! GET|POST         /api/models                 ?categoryId= &includeInactive=
//! GET|PATCH|DELETE /api/models/{id}
//! GET|POST         /api/colors                 ?modelId=
//! GET|PATCH|DELETE /api/colors/{id}
//! GET|POST         /api/storage-options        ?categoryId= &modelId=
//! GET|PATCH|DELETE /api/storage-options/{id}
//! GET|POST         /api/product-prices         ?modelId= &colorId= &storageId=
//! GET|PATCH|DELETE /api/product-prices/{id}
//! POST             /api/product-prices/import  - CSV upload (multipart "file")
//! GET              /api/product-details/{modelName}
//! GET              /api/price                  ?modelId= &storageId= &colorId=
//!
//! # Orders (create public, everything else admin)
//! GET|POST         /api/whatsapp-orders        ?status=
//! GET|PATCH|DELETE /api/whatsapp-orders/{id}
//! GET|POST         /api/apple-id-orders        ?status=
//! GET|PATCH|DELETE /api/apple-id-orders/{id}
//!
//! # Used phones
//! GET|POST         /api/used-phones            ?all=
//! GET|PATCH|DELETE /api/used-phones/{id}
//!
//! # Assistant, uploads, admin session
//! POST /api/chat                       - Rate limited
//! POST /api/upload                     - Admin
//! POST /api/upload/multiple            - Admin
//! POST /api/admin/login                - Rate limited
//! POST /api/admin/logout
//! GET  /api/auth/check
//!
//! # Analytics
//! POST /api/visits
//! GET  /api/visits/stats               - Admin
//! POST|GET|DELETE /api/error-logs      - GET and DELETE admin
//! ```

pub mod api;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor and response whose rejections use the API error shape.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor with JSON rejections.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameter extractor with JSON rejections.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Create all routes for the store.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api::routes())
}
