//! Shared gateway state

use std::sync::Arc;

use crate::clearing::ClearingService;
use crate::db::Database;
use crate::ledger::LedgerService;
use crate::settlement::OrderService;
use crate::transfer::TransferService;

/// Services shared by all request handlers
pub struct AppState {
    pub ledger: LedgerService,
    pub clearing: ClearingService,
    pub orders: OrderService,
    pub transfers: TransferService,
    /// Present only when running against PostgreSQL
    pub pg_db: Option<Arc<Database>>,
}
