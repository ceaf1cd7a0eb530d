//! HTTP gateway: router assembly and serving

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use state::AppState;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/wallet/{user_id}", get(handlers::wallet::get_wallet))
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/orders/{id}/transactions",
            get(handlers::orders::order_transactions),
        )
        .route("/orders/{id}/accept", post(handlers::orders::accept_order))
        .route(
            "/orders/{id}/delivered",
            post(handlers::orders::mark_delivered),
        )
        .route(
            "/orders/{id}/confirm",
            post(handlers::orders::confirm_order),
        )
        .route("/orders/{id}/cancel", post(handlers::orders::cancel_order))
        .route("/transfer", post(handlers::transfer::create_transfer))
        .route(
            "/admin/orders/{id}/resolve",
            post(handlers::orders::resolve_order),
        )
        .route("/admin/account", get(handlers::admin::admin_account))
        .route("/admin/recharge", post(handlers::admin::admin_recharge));

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until shutdown
pub async fn serve(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("gateway listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
