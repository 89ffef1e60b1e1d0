//! Admin session login, logout and status.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdmin, clear_current_admin, login_rate_limiter, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::ApiJson;
use crate::services::auth::verify_admin;
use crate::state::AppState;

/// Create the admin auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login).layer(login_rate_limiter()))
        .route("/admin/logout", post(logout))
        .route("/auth/check", get(check))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

impl From<Option<CurrentAdmin>> for AuthStatus {
    fn from(admin: Option<CurrentAdmin>) -> Self {
        Self {
            authenticated: admin.is_some(),
            username: admin.map(|a| a.username),
        }
    }
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {err}"))
}

/// POST /api/admin/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiJson<AuthStatus>> {
    let admin_config = &state.config().admin;
    if let Err(err) = verify_admin(admin_config, &request.username, &request.password) {
        tracing::warn!(username = %request.username.trim(), "Admin login rejected");
        return Err(err.into());
    }

    let admin = CurrentAdmin {
        username: admin_config.username.clone(),
        logged_in_at: Utc::now(),
    };
    set_current_admin(&session, &admin)
        .await
        .map_err(session_error)?;
    set_sentry_user(&admin.username);

    tracing::info!(admin = %admin.username, "Admin logged in");
    Ok(ApiJson(Some(admin).into()))
}

/// POST /api/admin/logout
async fn logout(
    session: Session,
    OptionalAdmin(admin): OptionalAdmin,
) -> Result<ApiJson<AuthStatus>> {
    clear_current_admin(&session).await.map_err(session_error)?;
    clear_sentry_user();

    if let Some(admin) = admin {
        tracing::info!(admin = %admin.username, "Admin logged out");
    }
    Ok(ApiJson(None.into()))
}

/// GET /api/auth/check
async fn check(OptionalAdmin(admin): OptionalAdmin) -> ApiJson<AuthStatus> {
    ApiJson(admin.into())
}
