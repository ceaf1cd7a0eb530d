//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::health::HealthData;
use crate::gateway::types::{RechargeApiRequest, ResolveApiRequest, TransferApiRequest};

/// Main API documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tijara Marketplace Ledger API",
        version = "1.0.0",
        description = "Wallet ledger and order settlement: balances, commission/cashback, escrow and transfers."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health,
        crate::gateway::handlers::wallet::get_wallet,
        crate::gateway::handlers::orders::create_order,
        crate::gateway::handlers::orders::get_order,
        crate::gateway::handlers::orders::order_transactions,
        crate::gateway::handlers::orders::accept_order,
        crate::gateway::handlers::orders::mark_delivered,
        crate::gateway::handlers::orders::confirm_order,
        crate::gateway::handlers::orders::cancel_order,
        crate::gateway::handlers::orders::resolve_order,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::admin::admin_account,
        crate::gateway::handlers::admin::admin_recharge,
    ),
    components(
        schemas(
            HealthData,
            TransferApiRequest,
            RechargeApiRequest,
            ResolveApiRequest,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage health"),
        (name = "Wallet", description = "Balance queries"),
        (name = "Orders", description = "Order lifecycle and settlement"),
        (name = "Transfer", description = "Peer-to-peer transfers"),
        (name = "Admin", description = "Clearing account, recharge and dispute resolution")
    )
)]
pub struct ApiDoc;
