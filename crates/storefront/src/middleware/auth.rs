//! Admin authentication extractors.
//!
//! Admin routes take a [`RequireAdmin`] argument; requests without a logged-in
//! session are rejected with a JSON 401 before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires an admin session.
///
/// # Example
///
/// ```rust,ignore
/// async fn delete_color(
///     RequireAdmin(admin): RequireAdmin,
///     Path(id): Path<ColorId>,
/// ) -> Result<StatusCode> {
///     tracing::info!(admin = %admin.username, "deleting color");
///     // ...
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAdmin(admin) = OptionalAdmin::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAdmin(None));

        admin
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that optionally gets the logged-in admin.
///
/// Public endpoints that show more to admins (inactive models, unapproved
/// listings) use this instead of [`RequireAdmin`].
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl OptionalAdmin {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Store the admin in the session, issuing a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Remove the admin from the session and delete it (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session.flush().await
}
