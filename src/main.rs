//! Tijara gateway entry point.
//!
//! Loads config, initializes logging, selects the storage backend
//! (PostgreSQL when `postgres_url` is configured, in-memory otherwise),
//! bootstraps the admin clearing account and serves the HTTP API.

use std::sync::Arc;

use tijara::clearing::ClearingService;
use tijara::commission::CommissionSettings;
use tijara::config::AppConfig;
use tijara::db::Database;
use tijara::gateway::{self, state::AppState};
use tijara::ledger::LedgerService;
use tijara::logging::init_logging;
use tijara::notify::LogNotifier;
use tijara::payment::MockGateway;
use tijara::settlement::OrderService;
use tijara::store::{LedgerStore, MemStore, PgStore};
use tijara::transfer::TransferService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);
    tracing::info!("starting tijara gateway, env={}", env);

    let mut pg_db = None;
    let store: Arc<dyn LedgerStore> = match &config.postgres_url {
        Some(url) => {
            let db = Arc::new(Database::connect(url).await?);
            let pg = PgStore::new(db.pool().clone());
            pg.init_schema().await?;
            tracing::info!("using PostgreSQL store");
            pg_db = Some(db);
            Arc::new(pg)
        }
        None => {
            tracing::warn!("no postgres_url configured, using in-memory store");
            Arc::new(MemStore::new())
        }
    };

    let clearing = ClearingService::new(store.clone());
    clearing.bootstrap(config.admin.seed_balance).await?;

    let settings = CommissionSettings {
        customer_commission_percent: config.commission.customer_commission_percent,
        cashback_percent: config.commission.cashback_percent,
    };
    let orders = OrderService::new(
        store.clone(),
        Arc::new(MockGateway::new()),
        Arc::new(LogNotifier),
        settings,
    );

    let state = Arc::new(AppState {
        ledger: LedgerService::new(store.clone()),
        clearing,
        orders,
        transfers: TransferService::new(store),
        pg_db,
    });

    gateway::serve(&config, state).await
}
