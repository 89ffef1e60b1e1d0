//! WhatsApp purchase requests and Apple ID requests.
//!
//! Customers submit a form; the order is saved and the response carries a
//! `wa.me` link that continues the conversation on WhatsApp. Admins follow
//! up through the list, patch and delete endpoints.

use axum::{Router, extract::State, http::StatusCode, routing::get};

use sib_store_core::{AppleIdOrderId, WhatsappOrderId};

use super::not_found;
use crate::db::{AppleIdOrderRepository, WhatsappOrderRepository};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::order::{
    AppleIdOrder, AppleIdOrderInput, OrderCreated, OrderFilter, OrderPatch, WhatsappOrder,
    WhatsappOrderInput,
};
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::whatsapp::{apple_id_message, order_message, resolve_catalog, whatsapp_link};
use crate::state::AppState;

/// Create the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/whatsapp-orders",
            get(list_whatsapp_orders).post(create_whatsapp_order),
        )
        .route(
            "/whatsapp-orders/{id}",
            get(get_whatsapp_order)
                .patch(update_whatsapp_order)
                .delete(delete_whatsapp_order),
        )
        .route(
            "/apple-id-orders",
            get(list_apple_id_orders).post(create_apple_id_order),
        )
        .route(
            "/apple-id-orders/{id}",
            get(get_apple_id_order)
                .patch(update_apple_id_order)
                .delete(delete_apple_id_order),
        )
}

// =============================================================================
// WhatsApp orders
// =============================================================================

/// POST /api/whatsapp-orders
async fn create_whatsapp_order(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<WhatsappOrderInput>,
) -> Result<(StatusCode, ApiJson<OrderCreated<WhatsappOrder>>)> {
    let mut order = input.validated()?;
    resolve_catalog(state.pool(), &mut order).await?;

    let order = WhatsappOrderRepository::new(state.pool())
        .create(&order)
        .await?;
    let whatsapp_url = whatsapp_link(&state.config().whatsapp_number, &order_message(&order));

    tracing::info!(order_id = %order.id, model = ?order.model_name, "WhatsApp order received");
    Ok((
        StatusCode::CREATED,
        ApiJson(OrderCreated {
            order,
            whatsapp_url,
        }),
    ))
}

/// GET /api/whatsapp-orders
async fn list_whatsapp_orders(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<ApiJson<Vec<WhatsappOrder>>> {
    let orders = WhatsappOrderRepository::new(state.pool())
        .list(filter.status)
        .await?;
    Ok(ApiJson(orders))
}

/// GET /api/whatsapp-orders/{id}
async fn get_whatsapp_order(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WhatsappOrderId>,
) -> Result<ApiJson<WhatsappOrder>> {
    WhatsappOrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Order"))
}

/// PATCH /api/whatsapp-orders/{id}
async fn update_whatsapp_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WhatsappOrderId>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<ApiJson<WhatsappOrder>> {
    let repo = WhatsappOrderRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Order"))?;
    let (status, note) = patch.apply(existing.status, existing.note)?;
    let order = repo.update_status(id, status, note.as_deref()).await?;

    add_breadcrumb(
        "orders",
        "Updated WhatsApp order",
        Some(&[("admin", admin.username.as_str()), ("status", order.status.label_fa())]),
    );
    Ok(ApiJson(order))
}

/// DELETE /api/whatsapp-orders/{id}
async fn delete_whatsapp_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WhatsappOrderId>,
) -> Result<StatusCode> {
    WhatsappOrderRepository::new(state.pool()).delete(id).await?;

    tracing::info!(admin = %admin.username, order_id = %id, "Deleted WhatsApp order");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Apple ID orders
// =============================================================================

/// POST /api/apple-id-orders
async fn create_apple_id_order(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AppleIdOrderInput>,
) -> Result<(StatusCode, ApiJson<OrderCreated<AppleIdOrder>>)> {
    let order = AppleIdOrderRepository::new(state.pool())
        .create(&input.validated()?)
        .await?;
    let whatsapp_url = whatsapp_link(&state.config().whatsapp_number, &apple_id_message(&order));

    tracing::info!(order_id = %order.id, "Apple ID order received");
    Ok((
        StatusCode::CREATED,
        ApiJson(OrderCreated {
            order,
            whatsapp_url,
        }),
    ))
}

/// GET /api/apple-id-orders
async fn list_apple_id_orders(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<ApiJson<Vec<AppleIdOrder>>> {
    let orders = AppleIdOrderRepository::new(state.pool())
        .list(filter.status)
        .await?;
    Ok(ApiJson(orders))
}

/// GET /api/apple-id-orders/{id}
async fn get_apple_id_order(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AppleIdOrderId>,
) -> Result<ApiJson<AppleIdOrder>> {
    AppleIdOrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(ApiJson)
        .ok_or_else(|| not_found("Order"))
}

/// PATCH /api/apple-id-orders/{id}
async fn update_apple_id_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AppleIdOrderId>,
    ApiJson(patch): ApiJson<OrderPatch>,
) -> Result<ApiJson<AppleIdOrder>> {
    let repo = AppleIdOrderRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or_else(|| not_found("Order"))?;
    let (status, note) = patch.apply(existing.status, existing.note)?;
    let order = repo.update_status(id, status, note.as_deref()).await?;

    add_breadcrumb(
        "orders",
        "Updated Apple ID order",
        Some(&[("admin", admin.username.as_str()), ("status", order.status.label_fa())]),
    );
    Ok(ApiJson(order))
}

/// DELETE /api/apple-id-orders/{id}
async fn delete_apple_id_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AppleIdOrderId>,
) -> Result<StatusCode> {
    AppleIdOrderRepository::new(state.pool()).delete(id).await?;

    tracing::info!(admin = %admin.username, order_id = %id, "Deleted Apple ID order");
    Ok(StatusCode::NO_CONTENT)
}
