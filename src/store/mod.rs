//! Persistence collaborator for the ledger core.
//!
//! The settlement logic never talks to a database directly; everything goes
//! through [`LedgerStore`]. Two backends exist:
//!
//! - [`PgStore`]: PostgreSQL via sqlx (row locks, CAS updates)
//! - [`MemStore`]: in-memory, for dev mode and deterministic tests
//!
//! The store is the atomicity boundary: one `apply_delta` call mutates a
//! balance AND inserts the ledger row together, or does neither.

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core_types::{AccountId, OrderId, ProductId, TxId, UserId};
use crate::error::LedgerError;
use crate::models::{
    AdminAccount, AdminDelta, LedgerTransaction, NewOrder, Order, OrderStatus, Product,
    TransferRecord, Wallet,
};

/// One balance mutation request.
///
/// `amount` is signed: negative debits, positive credits. `enforce_funds`
/// rejects debits that would drive the balance negative; credits and
/// explicit-override paths (refunds, rollbacks) skip the check.
#[derive(Debug, Clone)]
pub struct BalanceDelta {
    pub account: AccountId,
    pub amount: Decimal,
    pub tx_type: crate::models::TxType,
    pub description: String,
    pub metadata: serde_json::Value,
    pub reference_id: String,
    pub enforce_funds: bool,
}

impl BalanceDelta {
    /// Constrained debit: fails with `InsufficientFunds` if the balance
    /// cannot cover it.
    pub fn debit(
        account: AccountId,
        amount: Decimal,
        tx_type: crate::models::TxType,
        reference_id: impl Into<String>,
    ) -> Self {
        Self {
            account,
            amount: -amount,
            tx_type,
            description: String::new(),
            metadata: serde_json::Value::Null,
            reference_id: reference_id.into(),
            enforce_funds: true,
        }
    }

    /// Unconditional credit (refunds, cashback, recharges, rollbacks).
    pub fn credit(
        account: AccountId,
        amount: Decimal,
        tx_type: crate::models::TxType,
        reference_id: impl Into<String>,
    ) -> Self {
        Self {
            account,
            amount,
            tx_type,
            description: String::new(),
            metadata: serde_json::Value::Null,
            reference_id: reference_id.into(),
            enforce_funds: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Result of one applied (or deduplicated) balance mutation
#[derive(Debug, Clone, Copy)]
pub struct DeltaOutcome {
    /// Balance after the mutation, for immediate display and chained checks
    pub new_balance: Decimal,
    pub tx_id: TxId,
    /// True if this (reference_id, account, tx_type) was already applied;
    /// the original outcome is returned and nothing is re-applied
    pub deduplicated: bool,
}

/// Row storage for wallets, the admin account, ledger transactions, orders,
/// products and transfer records.
///
/// Implementations must make each individual method atomic; multi-step
/// business operations sequence these calls and compensate explicitly.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Wallets ===

    /// Create a wallet with balance 0. Idempotent per user.
    async fn create_wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError>;

    async fn get_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError>;

    // === Ledger primitive (storage half) ===

    /// Atomically mutate a balance and insert the ledger row.
    ///
    /// Deduplicates by `(reference_id, account, tx_type)`: a repeated
    /// application returns the original row without mutating again.
    async fn apply_delta(&self, delta: &BalanceDelta) -> Result<DeltaOutcome, LedgerError>;

    /// All ledger rows for one business event, oldest first. Enables full
    /// reconstruction of an order's financial history from the log alone.
    async fn transactions_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Vec<LedgerTransaction>, LedgerError>;

    // === Admin clearing account (singleton) ===

    /// Create the admin account with the given seed balance if it does not
    /// exist yet. Explicit bootstrap step; returns the current row.
    async fn ensure_admin(&self, seed_balance: Decimal) -> Result<AdminAccount, LedgerError>;

    async fn get_admin(&self) -> Result<AdminAccount, LedgerError>;

    /// Apply field increments atomically. Rejects updates that would drive
    /// `pending_funds` negative with `LedgerInconsistency` — never clamps.
    async fn update_admin(&self, delta: AdminDelta) -> Result<AdminAccount, LedgerError>;

    // === Orders ===

    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, LedgerError>;

    /// CAS status update: succeeds only if the current status matches
    /// `expected`. Returns false when another caller won the race.
    async fn update_order_status_if(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, LedgerError>;

    // === Products ===

    async fn upsert_product(&self, product: Product) -> Result<(), LedgerError>;

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, LedgerError>;

    /// Atomic stock adjustment; rejects going below zero with
    /// `StockUnavailable`. Returns the stock level after the change.
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<i64, LedgerError>;

    // === Transfers ===

    async fn insert_transfer(&self, record: &TransferRecord) -> Result<(), LedgerError>;

    /// Lookup by client idempotency key
    async fn get_transfer_by_cid(&self, cid: &str)
    -> Result<Option<TransferRecord>, LedgerError>;
}
