//! Ledger error taxonomy.
//!
//! One error type for the whole settlement core. Each variant carries a
//! stable code string for API responses and maps to an HTTP status.

use thiserror::Error;

/// Errors surfaced by the ledger, clearing, settlement and transfer paths.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    /// Debit would drive a constrained balance negative
    #[error("Insufficient funds in {account}")]
    InsufficientFunds { account: String },

    /// Wallet (or admin account) does not exist
    #[error("Account not found: {account}")]
    AccountNotFound { account: String },

    /// Order state machine rejected a transition
    #[error("Invalid state transition for order {order_id}: {from} -> {to}")]
    InvalidStateTransition {
        order_id: i64,
        from: &'static str,
        to: &'static str,
    },

    /// Not enough stock to reserve for a physical product
    #[error("Stock unavailable for product {product_id}: requested {requested}, available {available}")]
    StockUnavailable {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    /// Caller role does not permit the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invariant violation requiring manual reconciliation (e.g. a reversal
    /// that would drive pending funds negative). Never clamped silently.
    #[error("Ledger inconsistency: {0}")]
    LedgerInconsistency(String),

    /// Malformed input (amount, quantity, unknown product, bad payment method)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure. Raw driver errors are folded here and never shown
    /// to end users verbatim.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            LedgerError::StockUnavailable { .. } => "STOCK_UNAVAILABLE",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::LedgerInconsistency(_) => "LEDGER_INCONSISTENCY",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Suggested HTTP status code
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) => 400,
            LedgerError::Unauthorized(_) => 403,
            LedgerError::AccountNotFound { .. } => 404,
            LedgerError::InsufficientFunds { .. }
            | LedgerError::StockUnavailable { .. }
            | LedgerError::InvalidStateTransition { .. } => 422,
            LedgerError::LedgerInconsistency(_) | LedgerError::Database(_) => 500,
        }
    }

    /// Convenience constructor for wallet-not-found
    pub fn account_not_found(account: impl ToString) -> Self {
        LedgerError::AccountNotFound {
            account: account.to_string(),
        }
    }

    /// Convenience constructor for insufficient funds
    pub fn insufficient_funds(account: impl ToString) -> Self {
        LedgerError::InsufficientFunds {
            account: account.to_string(),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}
