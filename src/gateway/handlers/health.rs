//! Health check handler

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: &'static str,
    pub backend: &'static str,
}

/// Liveness and storage health
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthData),
        (status = 500, description = "Storage unreachable")
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthData> {
    let backend = match &state.pg_db {
        Some(db) => {
            db.health_check()
                .await
                .map_err(crate::error::LedgerError::from)?;
            "postgres"
        }
        None => "memory",
    };
    ok(HealthData {
        status: "ok",
        backend,
    })
}
