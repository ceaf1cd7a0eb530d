//! Admin clearing account operations.
//!
//! The admin account is the platform's clearing house: captured order funds
//! sit in `pending_funds` (escrow) until the order settles or cancels, and
//! net commission income lands in `balance`. Lifetime counters
//! (`total_commissions`, `total_cashbacks_paid`, `total_transactions`) only
//! ever grow.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info};

use crate::core_types::AccountId;
use crate::error::LedgerError;
use crate::models::{AdminAccount, AdminDelta, TxType};
use crate::store::{BalanceDelta, LedgerStore};

/// Escrow and commission bookkeeping on the admin singleton
#[derive(Clone)]
pub struct ClearingService {
    store: Arc<dyn LedgerStore>,
}

impl ClearingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create the admin account with a seed balance if it does not exist.
    /// Explicit bootstrap step, run once at startup.
    pub async fn bootstrap(&self, seed_balance: Decimal) -> Result<AdminAccount, LedgerError> {
        let admin = self.store.ensure_admin(seed_balance).await?;
        info!(balance = %admin.balance, pending = %admin.pending_funds, "admin clearing account ready");
        Ok(admin)
    }

    pub async fn summary(&self) -> Result<AdminAccount, LedgerError> {
        self.store.get_admin().await
    }

    /// Escrow a captured payment: the order's full amount enters
    /// `pending_funds` and stays there until settlement or cancellation.
    pub async fn reserve(&self, total_amount: Decimal) -> Result<(), LedgerError> {
        self.store
            .update_admin(AdminDelta {
                pending_funds: total_amount,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// Release escrow on settlement.
    ///
    /// The commission gain (commission minus cashback) moves through the
    /// admin balance with its own ledger row: a credit when commission
    /// exceeds cashback, a debit when cashback exceeds commission (the
    /// order's ledger rows must sum to zero either way). The counters
    /// record the gross commission and the cashback paid out.
    pub async fn release(
        &self,
        total_amount: Decimal,
        commission: Decimal,
        cashback: Decimal,
        admin_gain: Decimal,
        reference_id: &str,
    ) -> Result<(), LedgerError> {
        if admin_gain > Decimal::ZERO {
            self.store
                .apply_delta(
                    &BalanceDelta::credit(
                        AccountId::Admin,
                        admin_gain,
                        TxType::Commission,
                        reference_id,
                    )
                    .describe("commission income on settlement"),
                )
                .await?;
        } else if admin_gain < Decimal::ZERO {
            self.store
                .apply_delta(
                    &BalanceDelta::debit(
                        AccountId::Admin,
                        -admin_gain,
                        TxType::Commission,
                        reference_id,
                    )
                    .describe("cashback shortfall on settlement"),
                )
                .await?;
        }

        let result = self
            .store
            .update_admin(AdminDelta {
                pending_funds: -total_amount,
                total_commissions: commission,
                total_cashbacks_paid: cashback,
                ..Default::default()
            })
            .await;

        if let Err(ref e) = result {
            error!(reference_id, error = %e, "escrow release failed after commission credit");
        }
        result.map(|_| ())
    }

    /// Return escrowed funds on cancellation. Rejected (never clamped) if
    /// it would drive `pending_funds` negative.
    pub async fn reverse(&self, total_amount: Decimal) -> Result<(), LedgerError> {
        self.store
            .update_admin(AdminDelta {
                pending_funds: -total_amount,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
