//! Second-hand phone listings.
//!
//! Anyone may submit a listing; it stays hidden until an admin approves it.

use axum::{Router, extract::State, http::StatusCode, routing::get};

use sib_store_core::UsedPhoneId;

use super::not_found;
use crate::db::UsedPhoneRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::{OptionalAdmin, RequireAdmin};
use crate::models::used_phone::{UsedPhone, UsedPhoneFilter, UsedPhoneInput, UsedPhonePatch};
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// Create the used phones router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/used-phones", get(list_used_phones).post(create_used_phone))
        .route(
            "/used-phones/{id}",
            get(get_used_phone)
                .patch(update_used_phone)
                .delete(delete_used_phone),
        )
}

/// GET /api/used-phones
///
/// Approved, unsold listings; admins may ask for `?all=true`.
async fn list_used_phones(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiQuery(filter): ApiQuery<UsedPhoneFilter>,
) -> Result<ApiJson<Vec<UsedPhone>>> {
    let listings = UsedPhoneRepository::new(state.pool())
        .list(filter.all && viewer.is_admin())
        .await?;
    Ok(ApiJson(listings))
}

/// GET /api/used-phones/{id}
async fn get_used_phone(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiPath(id): ApiPath<UsedPhoneId>,
) -> Result<ApiJson<UsedPhone>> {
    UsedPhoneRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|listing| listing.is_approved || viewer.is_admin())
        .map(ApiJson)
        .ok_or_else(|| not_found("Listing"))
}

/// POST /api/used-phones
///
/// Public submissions are stored unapproved and unsold. Admin listings are
/// approved unless `isApproved` says otherwise.
async fn create_used_phone(
    State(state): State<AppState>,
    OptionalAdmin(admin): OptionalAdmin,
    ApiJson(input): ApiJson<UsedPhoneInput>,
) -> Result<(StatusCode, ApiJson<UsedPhone>)> {
    let mut input = input.validated()?;
    let approved = match &admin {
        Some(_) => input.is_approved.unwrap_or(true),
        None => {
            input.is_sold = false;
            false
        }
    };

    let listing = UsedPhoneRepository::new(state.pool())
        .create(&input, approved)
        .await?;

    tracing::info!(
        listing_id = %listing.id,
        approved,
        by_admin = admin.is_some(),
        "Used phone listing created"
    );
    Ok((StatusCode::CREATED, ApiJson(listing)))
}

/// PATCH /api/used-phones/{id}
async fn update_used_phone(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UsedPhoneId>,
    ApiJson(patch): ApiJson<UsedPhonePatch>,
) -> Result<ApiJson<UsedPhone>> {
    let repo = UsedPhoneRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Listing"))?;
    let listing = repo.update(id, &patch.apply(existing)?).await?;

    add_breadcrumb(
        "used_phones",
        "Updated listing",
        Some(&[("admin", admin.username.as_str()), ("model", listing.model_name.as_str())]),
    );
    Ok(ApiJson(listing))
}

/// DELETE /api/used-phones/{id}
async fn delete_used_phone(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UsedPhoneId>,
) -> Result<StatusCode> {
    UsedPhoneRepository::new(state.pool()).delete(id).await?;

    tracing::info!(admin = %admin.username, listing_id = %id, "Deleted used phone listing");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Method;
    use serde_json::{Value, json};

    use super::super::test_support::TestApp;
    use super::*;

    fn listing() -> Value {
        json!({
            "modelName": "iPhone 13",
            "storage": "128GB",
            "color": "Midnight",
            "condition": "Like new",
            "batteryHealth": 88,
            "price": 32_000_000,
            "sellerName": "Mina",
            "sellerPhone": "09121112233",
            "isApproved": true,
            "isSold": true
        })
    }

    #[tokio::test]
    async fn test_public_submission_waits_for_approval() {
        let app = TestApp::new().await;

        let (status, created) = app
            .call(Method::POST, "/api/used-phones", Some(listing()), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isApproved"], false);
        assert_eq!(created["isSold"], false);
        let id = created["id"].as_i64().unwrap();

        assert_eq!(app.get("/api/used-phones").await.1, json!([]));
        assert_eq!(
            app.get(&format!("/api/used-phones/{id}")).await.0,
            StatusCode::NOT_FOUND
        );

        let cookie = app.login().await;
        let (status, approved) = app
            .call(
                Method::PATCH,
                &format!("/api/used-phones/{id}"),
                Some(json!({ "isApproved": true })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["isApproved"], true);

        let (_, public) = app.get("/api/used-phones").await;
        assert_eq!(public.as_array().unwrap().len(), 1);
        assert_eq!(public[0]["sellerPhone"], "09121112233");
    }

    #[tokio::test]
    async fn test_admin_listing_defaults_to_approved() {
        let app = TestApp::new().await;
        let cookie = app.login().await;

        let mut body = listing();
        body["isApproved"] = Value::Null;
        body["isSold"] = json!(false);
        let (status, created) = app
            .call(Method::POST, "/api/used-phones", Some(body), Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isApproved"], true);

        let (status, _) = app
            .call(
                Method::PATCH,
                &format!("/api/used-phones/{}", created["id"]),
                Some(json!({ "isSold": true })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sold_listings_only_with_all() {
        let app = TestApp::new().await;
        let cookie = app.login().await;

        let (_, created) = app
            .call(Method::POST, "/api/used-phones", Some(listing()), Some(&cookie))
            .await;
        assert_eq!(created["isSold"], true);

        assert_eq!(app.get("/api/used-phones?all=true").await.1, json!([]));
        let (_, all) = app
            .call(Method::GET, "/api/used-phones?all=true", None, Some(&cookie))
            .await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_listing_rejected() {
        let app = TestApp::new().await;
        let mut body = listing();
        body["batteryHealth"] = json!(140);
        let (status, _) = app
            .call(Method::POST, "/api/used-phones", Some(body), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
