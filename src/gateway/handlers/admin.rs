//! Admin clearing account handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::error::LedgerError;
use crate::models::{AdminAccount, Wallet};

use super::super::state::AppState;
use super::super::types::{ApiResult, Auth, RechargeApiRequest, ok, parse_amount};

/// Clearing account summary: balance, escrow and lifetime counters
///
/// GET /api/v1/admin/account
#[utoipa::path(
    get,
    path = "/api/v1/admin/account",
    responses(
        (status = 200, description = "Admin account summary", content_type = "application/json"),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Admin"
)]
pub async fn admin_account(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
) -> ApiResult<AdminAccount> {
    if !auth.is_admin() {
        return Err(LedgerError::Unauthorized("admin role required".into()).into());
    }
    let admin = state.clearing.summary().await?;
    ok(admin)
}

/// Top up a user wallet from the admin balance
///
/// POST /api/v1/admin/recharge
#[utoipa::path(
    post,
    path = "/api/v1/admin/recharge",
    request_body = RechargeApiRequest,
    responses(
        (status = 200, description = "Wallet after recharge", content_type = "application/json"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Target wallet not found"),
        (status = 422, description = "Insufficient admin balance")
    ),
    tag = "Admin"
)]
pub async fn admin_recharge(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Json(req): Json<RechargeApiRequest>,
) -> ApiResult<Wallet> {
    let amount = parse_amount(&req.amount)?;
    let wallet = state
        .transfers
        .admin_recharge(auth, req.user_id, amount)
        .await?;
    ok(wallet)
}
