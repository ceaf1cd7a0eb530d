//! Tijara - Marketplace wallet ledger and order settlement
//!
//! A multi-role marketplace core (clients, sellers, admin) with wallets,
//! commissions, cashback and escrow-based order settlement.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (UserId, AccountId, Role)
//! - [`money`] - Amount validation and half-up rounding
//! - [`models`] - Wallets, ledger rows, orders, products, transfers
//! - [`error`] - Ledger error taxonomy
//! - [`commission`] - Commission/cashback calculator (pure)
//! - [`store`] - Persistence trait with Postgres and in-memory backends
//! - [`ledger`] - Validated balance mutations with audit trail
//! - [`clearing`] - Admin clearing account (escrow, commission income)
//! - [`settlement`] - Order state machine
//! - [`transfer`] - Peer transfers and admin recharge with compensation
//! - [`payment`] - External payment gateway seam
//! - [`notify`] - Best-effort notification sink
//! - [`gateway`] - HTTP API (axum + OpenAPI)

// Core types - must be first!
pub mod core_types;

pub mod commission;
pub mod error;
pub mod models;
pub mod money;

// Services
pub mod clearing;
pub mod ledger;
pub mod notify;
pub mod payment;
pub mod settlement;
pub mod store;
pub mod transfer;

// Infrastructure
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use clearing::ClearingService;
pub use commission::{CommissionSettings, OrderTotals, compute_order_totals};
pub use core_types::{AccountId, AuthContext, OrderId, ProductId, Role, TxId, UserId};
pub use error::LedgerError;
pub use ledger::LedgerService;
pub use models::{
    AdminAccount, LedgerTransaction, Order, OrderStatus, PaymentMethod, Product, TransferRecord,
    TransferState, TxType, Wallet,
};
pub use settlement::{CreateOrderRequest, OrderService};
pub use store::{BalanceDelta, DeltaOutcome, LedgerStore, MemStore, PgStore};
pub use transfer::TransferService;
