//! Peer transfer handler

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::models::TransferRecord;

use super::super::state::AppState;
use super::super::types::{ApiResult, Auth, TransferApiRequest, ok, parse_amount};

/// Transfer funds from the caller's wallet to another user
///
/// POST /api/v1/transfer
#[utoipa::path(
    post,
    path = "/api/v1/transfer",
    request_body = TransferApiRequest,
    responses(
        (status = 200, description = "Transfer committed", content_type = "application/json"),
        (status = 400, description = "Invalid amount or self-transfer"),
        (status = 404, description = "Target wallet not found"),
        (status = 422, description = "Insufficient funds")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Json(req): Json<TransferApiRequest>,
) -> ApiResult<TransferRecord> {
    let amount = parse_amount(&req.amount)?;
    let record = state
        .transfers
        .transfer(auth, req.to_user, amount, req.cid)
        .await?;
    ok(record)
}
