//! Fund transfers: peer-to-peer and admin-to-user recharge.
//!
//! Both are two-step sagas over the ledger primitive. The peer transfer
//! debits first and compensates with a `transfer_rollback` credit if the
//! credit leg fails, so a failed transfer nets to zero in the ledger.
//! The recharge credits the user first and debits the admin balance only
//! after the credit succeeded: the admin's available balance must reflect
//! only confirmed, already-credited recharges.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use ulid::Ulid;

use crate::core_types::{AccountId, AuthContext, UserId};
use crate::error::LedgerError;
use crate::ledger::LedgerService;
use crate::models::{TransferRecord, TransferState, TxType, Wallet};
use crate::money::validate_amount;
use crate::store::{BalanceDelta, LedgerStore};

/// Peer transfer and admin recharge entry points
#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn LedgerStore>,
    ledger: LedgerService,
}

impl TransferService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            ledger: LedgerService::new(store.clone()),
            store,
        }
    }

    /// Move funds between two user wallets.
    ///
    /// An optional client idempotency key (`cid`) makes retries safe: a
    /// repeated cid returns the recorded outcome without moving funds again.
    pub async fn transfer(
        &self,
        auth: AuthContext,
        to_user: UserId,
        amount: Decimal,
        cid: Option<String>,
    ) -> Result<TransferRecord, LedgerError> {
        validate_amount(amount)?;
        if to_user == auth.user_id {
            return Err(LedgerError::Validation(
                "cannot transfer to your own wallet".into(),
            ));
        }

        if let Some(cid) = &cid {
            if let Some(existing) = self.store.get_transfer_by_cid(cid).await? {
                info!(cid, state = %existing.state, "transfer cid replay, returning recorded outcome");
                return Ok(existing);
            }
        }

        let from = AccountId::Wallet(auth.user_id);
        let to = AccountId::Wallet(to_user);

        // Credit target must exist before we debit anything
        if self.store.get_wallet(to_user).await?.is_none() {
            return Err(LedgerError::account_not_found(to));
        }

        let reference_id = Ulid::new().to_string();
        let mut record = TransferRecord {
            reference_id: reference_id.clone(),
            cid,
            from_account: from,
            to_account: to,
            amount,
            state: TransferState::Failed,
            created_at: Utc::now(),
        };

        // Debit leg
        if let Err(e) = self
            .ledger
            .apply(
                BalanceDelta::debit(from, amount, TxType::TransferOut, reference_id.clone())
                    .describe(format!("transfer to {}", to)),
            )
            .await
        {
            self.store.insert_transfer(&record).await?;
            return Err(e);
        }

        // Credit leg; compensate the debit if it fails
        if let Err(e) = self
            .ledger
            .apply(
                BalanceDelta::credit(to, amount, TxType::TransferIn, reference_id.clone())
                    .describe(format!("transfer from {}", from)),
            )
            .await
        {
            warn!(%reference_id, error = %e, "credit leg failed, compensating debit");
            self.ledger
                .apply(
                    BalanceDelta::credit(
                        from,
                        amount,
                        TxType::TransferRollback,
                        reference_id.clone(),
                    )
                    .describe("compensating credit for failed transfer"),
                )
                .await
                .inspect_err(|rollback_err| {
                    error!(%reference_id, error = %rollback_err,
                           "compensating credit failed, manual reconciliation required");
                })?;
            record.state = TransferState::RolledBack;
            self.store.insert_transfer(&record).await?;
            return Err(e);
        }

        record.state = TransferState::Committed;
        self.store.insert_transfer(&record).await?;
        info!(%reference_id, from = %from, to = %to, %amount, "transfer committed");
        Ok(record)
    }

    /// Admin tops up a user wallet from the clearing account balance.
    ///
    /// Credits the user first; the admin debit runs only after the credit
    /// succeeded. A failed admin debit reverses the user credit.
    pub async fn admin_recharge(
        &self,
        auth: AuthContext,
        user_id: UserId,
        amount: Decimal,
    ) -> Result<Wallet, LedgerError> {
        if !auth.is_admin() {
            return Err(LedgerError::Unauthorized(
                "recharge requires the admin role".into(),
            ));
        }
        validate_amount(amount)?;

        let target = AccountId::Wallet(user_id);
        if self.store.get_wallet(user_id).await?.is_none() {
            return Err(LedgerError::account_not_found(target));
        }

        // Cheap pre-check; the real guard is the enforced admin debit below
        let admin = self.store.get_admin().await?;
        if admin.balance < amount {
            return Err(LedgerError::insufficient_funds(AccountId::Admin));
        }

        let reference_id = Ulid::new().to_string();
        self.ledger
            .apply(
                BalanceDelta::credit(target, amount, TxType::AdminRecharge, reference_id.clone())
                    .describe("wallet recharge"),
            )
            .await?;

        if let Err(e) = self
            .ledger
            .apply(
                BalanceDelta::debit(
                    AccountId::Admin,
                    amount,
                    TxType::AdminRecharge,
                    reference_id.clone(),
                )
                .describe(format!("recharge payout to {}", target)),
            )
            .await
        {
            warn!(%reference_id, error = %e, "admin debit failed, reversing user credit");
            self.ledger
                .apply(
                    BalanceDelta {
                        account: target,
                        amount: -amount,
                        tx_type: TxType::TransferRollback,
                        description: "reversal of failed recharge".to_string(),
                        metadata: serde_json::Value::Null,
                        reference_id: reference_id.clone(),
                        enforce_funds: false,
                    },
                )
                .await
                .inspect_err(|rollback_err| {
                    error!(%reference_id, error = %rollback_err,
                           "recharge reversal failed, manual reconciliation required");
                })?;
            return Err(e);
        }

        info!(%reference_id, user_id, %amount, "admin recharge committed");
        self.ledger.get_wallet(user_id).await
    }
}
