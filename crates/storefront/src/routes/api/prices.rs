//! Price rows, the CSV importer and the purchase wizard's lookups.

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use sib_store_core::{ColorId, ModelId, Price, PriceId, StorageId};

use super::{catalog_changed, not_found};
use crate::db::{PriceRepository, UpsertOutcome};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAdmin, RequireAdmin};
use crate::models::catalog::{
    PriceFilter, ProductDetails, ProductPrice, ProductPriceInput, ProductPricePatch,
};
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::catalog::product_details;
use crate::services::price_import::{ImportSummary, import_prices};
use crate::state::AppState;

/// Largest accepted CSV upload.
const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Create the prices router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/product-prices", get(list_prices).post(create_price))
        .route(
            "/product-prices/import",
            post(import_csv).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route(
            "/product-prices/{id}",
            get(get_price).patch(update_price).delete(delete_price),
        )
        .route("/product-details/{model_name}", get(get_product_details))
        .route("/price", get(lookup_price))
}

/// GET /api/product-prices
///
/// Inactive rows are listed for admins who ask for them.
async fn list_prices(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiQuery(mut filter): ApiQuery<PriceFilter>,
) -> Result<ApiJson<Vec<ProductPrice>>> {
    filter.include_inactive &= viewer.is_admin();
    let prices = PriceRepository::new(state.pool()).list(&filter).await?;
    Ok(ApiJson(prices))
}

/// GET /api/product-prices/{id}
async fn get_price(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiPath(id): ApiPath<PriceId>,
) -> Result<ApiJson<ProductPrice>> {
    PriceRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|price| price.is_active || viewer.is_admin())
        .map(ApiJson)
        .ok_or_else(|| not_found("Price"))
}

/// POST /api/product-prices
///
/// Upserts on (model, color, storage): 201 for a new row, 200 when an
/// existing row was replaced.
async fn create_price(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductPriceInput>,
) -> Result<(StatusCode, ApiJson<ProductPrice>)> {
    let input = input.validated()?;
    let (price, outcome) = PriceRepository::new(state.pool()).upsert(&input).await?;

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    catalog_changed(&state, &admin, "Saved price", &price.id.to_string()).await;
    Ok((status, ApiJson(price)))
}

/// PATCH /api/product-prices/{id}
async fn update_price(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PriceId>,
    ApiJson(patch): ApiJson<ProductPricePatch>,
) -> Result<ApiJson<ProductPrice>> {
    let repo = PriceRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Price"))?;
    let price = repo.update(id, &patch.apply(existing)?).await?;

    catalog_changed(&state, &admin, "Updated price", &id.to_string()).await;
    Ok(ApiJson(price))
}

/// DELETE /api/product-prices/{id}
async fn delete_price(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PriceId>,
) -> Result<StatusCode> {
    PriceRepository::new(state.pool()).delete(id).await?;

    catalog_changed(&state, &admin, "Deleted price", &id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/product-prices/import
///
/// Multipart upload with the spreadsheet in the `file` field.
async fn import_csv(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiJson<ImportSummary>> {
    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            data = Some(field.bytes().await?);
            break;
        }
    }
    let data = data.ok_or_else(|| AppError::BadRequest("CSV file is required".to_string()))?;

    let summary = import_prices(state.pool(), &data).await?;

    catalog_changed(&state, &admin, "Imported prices", &summary.to_string()).await;
    Ok(ApiJson(summary))
}

/// GET /api/product-details/{modelName}
async fn get_product_details(
    State(state): State<AppState>,
    ApiPath(model_name): ApiPath<String>,
) -> Result<ApiJson<Arc<ProductDetails>>> {
    product_details(state.pool(), state.cache(), &model_name)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Model"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceLookupQuery {
    model_id: ModelId,
    storage_id: StorageId,
    color_id: ColorId,
}

/// The active price for one combination; all fields are `null` when the
/// combination is not sold.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceLookup {
    price: Option<Price>,
    stock: Option<i64>,
    price_id: Option<PriceId>,
}

/// GET /api/price
async fn lookup_price(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PriceLookupQuery>,
) -> Result<ApiJson<PriceLookup>> {
    let found = PriceRepository::new(state.pool())
        .find_active(query.model_id, query.color_id, query.storage_id)
        .await?;

    Ok(ApiJson(found.map_or_else(PriceLookup::default, |row| {
        PriceLookup {
            price: Some(row.price),
            stock: Some(row.stock),
            price_id: Some(row.id),
        }
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, header::CONTENT_TYPE, header::COOKIE},
    };
    use serde_json::json;

    use super::super::test_support::{TestApp, read_json, seed_catalog};
    use super::*;

    #[tokio::test]
    async fn test_product_details_omit_unpriced_combinations() {
        let app = TestApp::new().await;
        seed_catalog(app.state.pool()).await;

        let (status, details) = app.get("/api/product-details/iPhone-16-Pro").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["model"]["nameEn"], "iPhone 16 Pro");
        assert_eq!(details["category"]["slug"], "iphone");

        let options = details["storageOptions"].as_array().unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0]["storage"]["nameEn"], "256GB");
        assert_eq!(options[0]["colors"].as_array().unwrap().len(), 1);
        assert_eq!(options[0]["colors"][0]["price"], 90_000_000);
        assert_eq!(options[0]["colors"][0]["stock"], 3);

        let (status, _) = app.get("/api/product-details/Galaxy-S24").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_price_lookup() {
        let app = TestApp::new().await;
        let s = seed_catalog(app.state.pool()).await;

        let (status, found) = app
            .get(&format!(
                "/api/price?modelId={}&storageId={}&colorId={}",
                s.model, s.gb256, s.white
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["price"], 90_000_000);
        assert_eq!(found["stock"], 3);

        let (_, missing) = app
            .get(&format!(
                "/api/price?modelId={}&storageId={}&colorId={}",
                s.model, s.gb512, s.black
            ))
            .await;
        assert_eq!(missing, json!({ "price": null, "stock": null, "priceId": null }));

        let (status, _) = app.get("/api/price?modelId=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_upserts_on_combination() {
        let app = TestApp::new().await;
        let s = seed_catalog(app.state.pool()).await;
        let cookie = app.login().await;

        let body = json!({
            "modelId": s.model,
            "colorId": s.black,
            "storageId": s.gb512,
            "price": 110_000_000,
            "stock": 1
        });
        let (status, created) = app
            .call(Method::POST, "/api/product-prices", Some(body), Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let body = json!({
            "modelId": s.model,
            "colorId": s.black,
            "storageId": s.gb512,
            "price": 105_000_000
        });
        let (status, updated) = app
            .call(Method::POST, "/api/product-prices", Some(body), Some(&cookie))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["price"], 105_000_000);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/product-prices",
                Some(json!({
                    "modelId": s.model,
                    "colorId": s.black,
                    "storageId": s.gb512,
                    "price": 0
                })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deactivated_price_hidden_from_public() {
        let app = TestApp::new().await;
        let s = seed_catalog(app.state.pool()).await;
        let cookie = app.login().await;

        let (_, rows) = app
            .get(&format!("/api/product-prices?modelId={}", s.model))
            .await;
        let id = rows[0]["id"].as_i64().unwrap();

        let (status, patched) = app
            .call(
                Method::PATCH,
                &format!("/api/product-prices/{id}"),
                Some(json!({ "isActive": false })),
                Some(&cookie),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["isActive"], false);

        let (status, _) = app.get(&format!("/api/product-prices/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, public) = app.get("/api/product-prices?includeInactive=true").await;
        assert_eq!(public, json!([]));
        let (_, admin) = app
            .call(
                Method::GET,
                "/api/product-prices?includeInactive=true",
                None,
                Some(&cookie),
            )
            .await;
        assert_eq!(admin.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_updates_prices_and_refreshes_details() {
        let app = TestApp::new().await;
        seed_catalog(app.state.pool()).await;
        let cookie = app.login().await;

        // Warm the cache
        let (_, before) = app.get("/api/product-details/iphone-16-pro").await;
        assert_eq!(before["storageOptions"][0]["colors"][0]["price"], 90_000_000);

        let csv = "Model,Color,Storage,Price\n\
                   iPhone 16 Pro,white,256GB,\"95,000,000\"\n\
                   Galaxy S24,black,256GB,1000\n";
        let body = format!(
            "--BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"prices.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --BOUNDARY--\r\n"
        );
        let request = Request::post("/api/product-prices/import")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .header(COOKIE, &cookie)
            .body(Body::from(body))
            .unwrap();
        let (status, summary) = read_json(app.send(request).await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalRows"], 2);
        assert_eq!(summary["successCount"], 1);
        assert_eq!(summary["updatedCount"], 1);
        assert_eq!(summary["errorCount"], 1);
        assert_eq!(summary["errors"][0], "Row 3: unknown model 'Galaxy S24'");

        let (_, after) = app.get("/api/product-details/iphone-16-pro").await;
        assert_eq!(after["storageOptions"][0]["colors"][0]["price"], 95_000_000);
    }

    #[tokio::test]
    async fn test_import_requires_file_field() {
        let app = TestApp::new().await;
        let cookie = app.login().await;

        let body = "--B\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--B--\r\n";
        let request = Request::post("/api/product-prices/import")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=B")
            .header(COOKIE, &cookie)
            .body(Body::from(body))
            .unwrap();
        let (status, body) = read_json(app.send(request).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "CSV file is required");
    }
}
