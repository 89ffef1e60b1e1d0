//! Catalog CRUD: categories, models, colors and storage options.
//!
//! Reads are public. Writes need an admin session and clear the catalog
//! cache so product details and the chat context pick up the change.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use sib_store_core::{CategoryId, ColorId, ModelId, StorageId};

use super::{catalog_changed, not_found};
use crate::db::{
    CategoryRepository, ColorRepository, ProductModelRepository, StorageOptionRepository,
};
use crate::error::Result;
use crate::middleware::{OptionalAdmin, RequireAdmin};
use crate::models::catalog::{
    Category, CategoryInput, CategoryPatch, Color, ColorInput, ColorPatch, ProductModel,
    ProductModelInput, ProductModelPatch, StorageOption, StorageOptionInput, StorageOptionPatch,
};
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// Create the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).patch(update_model).delete(delete_model),
        )
        .route("/colors", get(list_colors).post(create_color))
        .route(
            "/colors/{id}",
            get(get_color).patch(update_color).delete(delete_color),
        )
        .route(
            "/storage-options",
            get(list_storage_options).post(create_storage_option),
        )
        .route(
            "/storage-options/{id}",
            get(get_storage_option)
                .patch(update_storage_option)
                .delete(delete_storage_option),
        )
}

// =============================================================================
// Categories
// =============================================================================

/// GET /api/categories
async fn list_categories(State(state): State<AppState>) -> Result<ApiJson<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(ApiJson(categories))
}

/// GET /api/categories/{id}
async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<ApiJson<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Category"))
}

/// POST /api/categories
async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, ApiJson<Category>)> {
    let input = input.validated()?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;

    catalog_changed(&state, &admin, "Created category", &category.slug).await;
    Ok((StatusCode::CREATED, ApiJson(category)))
}

/// PATCH /api/categories/{id}
async fn update_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<ApiJson<Category>> {
    let repo = CategoryRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Category"))?;
    let category = repo.update(id, &patch.apply(existing)?).await?;

    catalog_changed(&state, &admin, "Updated category", &category.slug).await;
    Ok(ApiJson(category))
}

/// DELETE /api/categories/{id}
///
/// Cascades to the category's models and their prices.
async fn delete_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;

    catalog_changed(&state, &admin, "Deleted category", &id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelListQuery {
    category_id: Option<CategoryId>,
    #[serde(default)]
    include_inactive: bool,
}

/// GET /api/models
///
/// `includeInactive` is honored for admins only.
async fn list_models(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiQuery(query): ApiQuery<ModelListQuery>,
) -> Result<ApiJson<Vec<ProductModel>>> {
    let include_inactive = query.include_inactive && viewer.is_admin();
    let models = ProductModelRepository::new(state.pool())
        .list(query.category_id, include_inactive)
        .await?;
    Ok(ApiJson(models))
}

/// GET /api/models/{id}
///
/// Inactive models are hidden from the public.
async fn get_model(
    State(state): State<AppState>,
    viewer: OptionalAdmin,
    ApiPath(id): ApiPath<ModelId>,
) -> Result<ApiJson<ProductModel>> {
    ProductModelRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|model| model.is_active || viewer.is_admin())
        .map(ApiJson)
        .ok_or_else(|| not_found("Model"))
}

/// POST /api/models
async fn create_model(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductModelInput>,
) -> Result<(StatusCode, ApiJson<ProductModel>)> {
    let input = input.validated()?;
    let model = ProductModelRepository::new(state.pool())
        .create(&input)
        .await?;

    catalog_changed(&state, &admin, "Created model", &model.name_en).await;
    Ok((StatusCode::CREATED, ApiJson(model)))
}

/// PATCH /api/models/{id}
async fn update_model(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ModelId>,
    ApiJson(patch): ApiJson<ProductModelPatch>,
) -> Result<ApiJson<ProductModel>> {
    let repo = ProductModelRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Model"))?;
    let model = repo.update(id, &patch.apply(existing)?).await?;

    catalog_changed(&state, &admin, "Updated model", &model.name_en).await;
    Ok(ApiJson(model))
}

/// DELETE /api/models/{id}
async fn delete_model(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ModelId>,
) -> Result<StatusCode> {
    ProductModelRepository::new(state.pool()).delete(id).await?;

    catalog_changed(&state, &admin, "Deleted model", &id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Colors
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColorListQuery {
    model_id: Option<ModelId>,
}

/// GET /api/colors
///
/// With `modelId`, only colors that have an active price for the model.
async fn list_colors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ColorListQuery>,
) -> Result<ApiJson<Vec<Color>>> {
    let colors = ColorRepository::new(state.pool())
        .list(query.model_id)
        .await?;
    Ok(ApiJson(colors))
}

/// GET /api/colors/{id}
async fn get_color(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ColorId>,
) -> Result<ApiJson<Color>> {
    ColorRepository::new(state.pool())
        .get(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Color"))
}

/// POST /api/colors
async fn create_color(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ColorInput>,
) -> Result<(StatusCode, ApiJson<Color>)> {
    let input = input.validated()?;
    let color = ColorRepository::new(state.pool()).create(&input).await?;

    catalog_changed(&state, &admin, "Created color", &color.name_en).await;
    Ok((StatusCode::CREATED, ApiJson(color)))
}

/// PATCH /api/colors/{id}
async fn update_color(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ColorId>,
    ApiJson(patch): ApiJson<ColorPatch>,
) -> Result<ApiJson<Color>> {
    let repo = ColorRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Color"))?;
    let color = repo.update(id, &patch.apply(existing)?).await?;

    catalog_changed(&state, &admin, "Updated color", &color.name_en).await;
    Ok(ApiJson(color))
}

/// DELETE /api/colors/{id}
async fn delete_color(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ColorId>,
) -> Result<StatusCode> {
    ColorRepository::new(state.pool()).delete(id).await?;

    catalog_changed(&state, &admin, "Deleted color", &id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Storage options
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageListQuery {
    category_id: Option<CategoryId>,
    model_id: Option<ModelId>,
}

/// GET /api/storage-options
async fn list_storage_options(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StorageListQuery>,
) -> Result<ApiJson<Vec<StorageOption>>> {
    let options = StorageOptionRepository::new(state.pool())
        .list(query.category_id, query.model_id)
        .await?;
    Ok(ApiJson(options))
}

/// GET /api/storage-options/{id}
async fn get_storage_option(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StorageId>,
) -> Result<ApiJson<StorageOption>> {
    StorageOptionRepository::new(state.pool())
        .get(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Storage option"))
}

/// POST /api/storage-options
async fn create_storage_option(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<StorageOptionInput>,
) -> Result<(StatusCode, ApiJson<StorageOption>)> {
    let input = input.validated()?;
    let option = StorageOptionRepository::new(state.pool())
        .create(&input)
        .await?;

    catalog_changed(&state, &admin, "Created storage option", &option.name_en).await;
    Ok((StatusCode::CREATED, ApiJson(option)))
}

/// PATCH /api/storage-options/{id}
async fn update_storage_option(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StorageId>,
    ApiJson(patch): ApiJson<StorageOptionPatch>,
) -> Result<ApiJson<StorageOption>> {
    let repo = StorageOptionRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| not_found("Storage option"))?;
    let option = repo.update(id, &patch.apply(existing)?).await?;

    catalog_changed(&state, &admin, "Updated storage option", &option.name_en).await;
    Ok(ApiJson(option))
}

/// DELETE /api/storage-options/{id}
async fn delete_storage_option(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StorageId>,
) -> Result<StatusCode> {
    StorageOptionRepository::new(state.pool()).delete(id).await?;

    catalog_changed(&state, &admin, "Deleted storage option", &id.to_string()).await;
    Ok(StatusCode::NO_CONTENT)
}
