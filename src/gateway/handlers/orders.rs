//! Order lifecycle handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use crate::models::{LedgerTransaction, Order};
use crate::settlement::CreateOrderRequest;

use super::super::state::AppState;
use super::super::types::{ApiResult, Auth, ResolveApiRequest, ok};

/// Create an order
///
/// POST /api/v1/orders
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body(content = String, description = "Order request: product_id, quantity, payment_method", content_type = "application/json"),
    responses(
        (status = 200, description = "Order created", content_type = "application/json"),
        (status = 400, description = "Invalid parameters or payment declined"),
        (status = 401, description = "Missing auth headers"),
        (status = 422, description = "Insufficient funds or stock")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Order> {
    let order = state.orders.create_order(auth, req).await?;
    ok(order)
}

/// Get an order by id
///
/// GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order", content_type = "application/json"),
        (status = 400, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Auth(_auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.get_order(order_id).await?;
    ok(order)
}

/// Ledger rows for an order's business event
///
/// GET /api/v1/orders/{id}/transactions
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/transactions",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Transaction rows, oldest first", content_type = "application/json")
    ),
    tag = "Orders"
)]
pub async fn order_transactions(
    State(state): State<Arc<AppState>>,
    Auth(_auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Vec<LedgerTransaction>> {
    let order = state.orders.get_order(order_id).await?;
    let rows = state.ledger.history(&order.reference_id).await?;
    ok(rows)
}

/// Seller accepts a pending order
///
/// POST /api/v1/orders/{id}/accept
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/accept",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order confirmed", content_type = "application/json"),
        (status = 403, description = "Caller is not the seller"),
        (status = 422, description = "Invalid state transition")
    ),
    tag = "Orders"
)]
pub async fn accept_order(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.accept(auth, order_id).await?;
    ok(order)
}

/// Seller marks an order delivered
///
/// POST /api/v1/orders/{id}/delivered
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/delivered",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order delivered", content_type = "application/json"),
        (status = 403, description = "Caller is not the seller"),
        (status = 422, description = "Invalid state transition")
    ),
    tag = "Orders"
)]
pub async fn mark_delivered(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.mark_delivered(auth, order_id).await?;
    ok(order)
}

/// Buyer confirms receipt and settles the order
///
/// POST /api/v1/orders/{id}/confirm
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/confirm",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed, funds settled", content_type = "application/json"),
        (status = 403, description = "Caller is not the buyer"),
        (status = 422, description = "Order was not delivered")
    ),
    tag = "Orders"
)]
pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.confirm(auth, order_id).await?;
    ok(order)
}

/// Buyer cancels a pending order
///
/// POST /api/v1/orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled, refund issued if captured", content_type = "application/json"),
        (status = 403, description = "Caller is not the buyer"),
        (status = 422, description = "Order is not pending")
    ),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.cancel(auth, order_id).await?;
    ok(order)
}

/// Admin resolves a disputed order
///
/// POST /api/v1/admin/orders/{id}/resolve
#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/resolve",
    params(("id" = i64, Path, description = "Order id")),
    request_body = ResolveApiRequest,
    responses(
        (status = 200, description = "Order resolved", content_type = "application/json"),
        (status = 403, description = "Caller is not an admin"),
        (status = 422, description = "Order already terminal")
    ),
    tag = "Admin"
)]
pub async fn resolve_order(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(order_id): Path<i64>,
    Json(req): Json<ResolveApiRequest>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .resolve_dispute(auth, order_id, req.approve)
        .await?;
    ok(order)
}
