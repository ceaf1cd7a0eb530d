//! Wallet handlers

use std::sync::Arc;

use axum::extract::{Path, State};

use crate::models::Wallet;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, Auth, error_codes, ok};

/// Get a wallet. Users may read their own wallet; admins may read any.
///
/// GET /api/v1/wallet/{user_id}
#[utoipa::path(
    get,
    path = "/api/v1/wallet/{user_id}",
    params(("user_id" = i64, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Wallet with current balance", content_type = "application/json"),
        (status = 403, description = "Not the wallet owner"),
        (status = 404, description = "Wallet not found")
    ),
    tag = "Wallet"
)]
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(user_id): Path<i64>,
) -> ApiResult<Wallet> {
    if auth.user_id != user_id && !auth.is_admin() {
        return ApiError::new(
            axum::http::StatusCode::FORBIDDEN,
            error_codes::FORBIDDEN,
            "cannot read another user's wallet",
        )
        .into_err();
    }

    let wallet = state.ledger.get_wallet(user_id).await?;
    ok(wallet)
}
