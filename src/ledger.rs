//! Ledger service: validated balance mutations with an audit trail.
//!
//! Single choke point for money movement. Every mutation is validated,
//! applied atomically by the store, logged, and leaves exactly one
//! immutable ledger row (or none, when the store deduplicates a retry).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::core_types::{AccountId, UserId};
use crate::error::LedgerError;
use crate::models::{LedgerTransaction, Wallet};
use crate::money::validate_amount;
use crate::store::{BalanceDelta, DeltaOutcome, LedgerStore};

/// Validated access to wallet balances and the transaction log
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Create a wallet with balance 0. Idempotent per user.
    pub async fn create_wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError> {
        let wallet = self.store.create_wallet(user_id).await?;
        info!(user_id, "wallet ready");
        Ok(wallet)
    }

    pub async fn get_wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError> {
        self.store
            .get_wallet(user_id)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(AccountId::Wallet(user_id)))
    }

    pub async fn balance(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        match account {
            AccountId::Wallet(uid) => Ok(self.get_wallet(uid).await?.balance),
            AccountId::Admin => Ok(self.store.get_admin().await?.balance),
        }
    }

    /// Apply one validated balance mutation.
    ///
    /// The magnitude must be positive, at most 2 decimal places, and within
    /// the per-transaction cap. Retries with the same
    /// `(reference_id, account, tx_type)` are deduplicated by the store.
    pub async fn apply(&self, delta: BalanceDelta) -> Result<DeltaOutcome, LedgerError> {
        validate_amount(delta.amount.abs())?;

        let outcome = self.store.apply_delta(&delta).await?;
        if outcome.deduplicated {
            warn!(
                account = %delta.account,
                tx_type = %delta.tx_type,
                reference_id = %delta.reference_id,
                "duplicate ledger mutation suppressed"
            );
        } else {
            info!(
                account = %delta.account,
                amount = %delta.amount,
                tx_type = %delta.tx_type,
                reference_id = %delta.reference_id,
                new_balance = %outcome.new_balance,
                "ledger mutation applied"
            );
        }
        Ok(outcome)
    }

    /// All ledger rows sharing one reference id, oldest first
    pub async fn history(&self, reference_id: &str) -> Result<Vec<LedgerTransaction>, LedgerError> {
        self.store.transactions_by_reference(reference_id).await
    }
}
