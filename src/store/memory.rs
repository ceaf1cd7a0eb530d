//! In-memory store.
//!
//! Backs dev mode (no `postgres_url` configured) and deterministic tests.
//! A single mutex makes every store call atomic, which mirrors the
//! per-mutation atomicity the Postgres backend gets from row locks.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::core_types::{AccountId, OrderId, ProductId, UserId};
use crate::error::LedgerError;
use crate::models::{
    AdminAccount, AdminDelta, LedgerTransaction, NewOrder, Order, OrderStatus, Product,
    TransferRecord, Wallet,
};

use super::{BalanceDelta, DeltaOutcome, LedgerStore};

#[derive(Default)]
struct Inner {
    wallets: HashMap<UserId, Wallet>,
    admin: Option<AdminAccount>,
    transactions: Vec<LedgerTransaction>,
    next_tx_id: i64,
    orders: HashMap<OrderId, Order>,
    next_order_id: i64,
    products: HashMap<ProductId, Product>,
    transfers: Vec<TransferRecord>,
    /// Fault injection: fail the next credit to this account
    fail_next_credit: Option<AccountId>,
    /// Fault injection: fail the next positive stock adjustment
    fail_next_stock_restore: bool,
}

/// In-memory [`LedgerStore`] implementation
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next positive-amount `apply_delta` against `account` fail
    /// with a storage error. Used to exercise the compensating-rollback
    /// path of transfers.
    pub fn set_fail_next_credit(&self, account: AccountId) {
        self.inner.lock().unwrap().fail_next_credit = Some(account);
    }

    /// Make the next positive-delta `adjust_stock` fail with a storage
    /// error. Exercises failed compensating stock restores.
    pub fn set_fail_next_stock_restore(&self) {
        self.inner.lock().unwrap().fail_next_stock_restore = true;
    }

    /// Total number of ledger rows (test helper)
    pub fn transaction_count(&self) -> usize {
        self.inner.lock().unwrap().transactions.len()
    }
}

impl Inner {
    fn balance_of(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        match account {
            AccountId::Wallet(uid) => self
                .wallets
                .get(&uid)
                .map(|w| w.balance)
                .ok_or_else(|| LedgerError::account_not_found(account)),
            AccountId::Admin => self
                .admin
                .as_ref()
                .map(|a| a.balance)
                .ok_or_else(|| LedgerError::account_not_found(account)),
        }
    }

    fn set_balance(&mut self, account: AccountId, balance: Decimal) {
        match account {
            AccountId::Wallet(uid) => {
                if let Some(w) = self.wallets.get_mut(&uid) {
                    w.balance = balance;
                }
            }
            AccountId::Admin => {
                if let Some(a) = self.admin.as_mut() {
                    a.balance = balance;
                    a.total_transactions += 1;
                    a.updated_at = Utc::now();
                }
            }
        }
    }
}

#[async_trait]
impl LedgerStore for MemStore {
    async fn create_wallet(&self, user_id: UserId) -> Result<Wallet, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let wallet = inner.wallets.entry(user_id).or_insert_with(|| Wallet {
            user_id,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        });
        Ok(wallet.clone())
    }

    async fn get_wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.wallets.get(&user_id).cloned())
    }

    async fn apply_delta(&self, delta: &BalanceDelta) -> Result<DeltaOutcome, LedgerError> {
        let mut inner = self.inner.lock().unwrap();

        // Retry dedup: same business event, same account, same type
        if let Some(existing) = inner.transactions.iter().find(|t| {
            t.reference_id == delta.reference_id
                && t.account == delta.account
                && t.tx_type == delta.tx_type
        }) {
            let tx_id = existing.tx_id;
            let new_balance = inner.balance_of(delta.account)?;
            return Ok(DeltaOutcome {
                new_balance,
                tx_id,
                deduplicated: true,
            });
        }

        if delta.amount > Decimal::ZERO && inner.fail_next_credit == Some(delta.account) {
            inner.fail_next_credit = None;
            return Err(LedgerError::Database("injected credit failure".into()));
        }

        let balance = inner.balance_of(delta.account)?;
        let new_balance = balance + delta.amount;
        if delta.enforce_funds && delta.amount < Decimal::ZERO && new_balance < Decimal::ZERO {
            return Err(LedgerError::insufficient_funds(delta.account));
        }

        inner.set_balance(delta.account, new_balance);
        inner.next_tx_id += 1;
        let tx_id = inner.next_tx_id;
        inner.transactions.push(LedgerTransaction {
            tx_id,
            account: delta.account,
            amount: delta.amount,
            tx_type: delta.tx_type,
            description: delta.description.clone(),
            metadata: delta.metadata.clone(),
            reference_id: delta.reference_id.clone(),
            created_at: Utc::now(),
        });

        Ok(DeltaOutcome {
            new_balance,
            tx_id,
            deduplicated: false,
        })
    }

    async fn transactions_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Vec<LedgerTransaction>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.reference_id == reference_id)
            .cloned()
            .collect())
    }

    async fn ensure_admin(&self, seed_balance: Decimal) -> Result<AdminAccount, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let admin = inner.admin.get_or_insert_with(|| AdminAccount {
            balance: seed_balance,
            pending_funds: Decimal::ZERO,
            total_commissions: Decimal::ZERO,
            total_cashbacks_paid: Decimal::ZERO,
            total_transactions: 0,
            updated_at: Utc::now(),
        });
        Ok(admin.clone())
    }

    async fn get_admin(&self) -> Result<AdminAccount, LedgerError> {
        let inner = self.inner.lock().unwrap();
        inner
            .admin
            .clone()
            .ok_or_else(|| LedgerError::account_not_found(AccountId::Admin))
    }

    async fn update_admin(&self, delta: AdminDelta) -> Result<AdminAccount, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        let admin = inner
            .admin
            .as_mut()
            .ok_or_else(|| LedgerError::account_not_found(AccountId::Admin))?;

        let pending = admin.pending_funds + delta.pending_funds;
        if pending < Decimal::ZERO {
            return Err(LedgerError::LedgerInconsistency(format!(
                "pending_funds would go negative: {} + {}",
                admin.pending_funds, delta.pending_funds
            )));
        }

        admin.balance += delta.balance;
        admin.pending_funds = pending;
        admin.total_commissions += delta.total_commissions;
        admin.total_cashbacks_paid += delta.total_cashbacks_paid;
        admin.total_transactions += delta.total_transactions;
        admin.updated_at = Utc::now();
        Ok(admin.clone())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_order_id += 1;
        let order_id = inner.next_order_id;
        let now = Utc::now();
        let row = Order {
            order_id,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            product_id: order.product_id,
            quantity: order.quantity,
            unit_price: order.unit_price,
            subtotal: order.subtotal,
            commission: order.commission,
            cashback: order.cashback,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: OrderStatus::Pending,
            commission_percent: order.commission_percent,
            cashback_percent: order.cashback_percent,
            reference_id: order.reference_id,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order_id, row.clone());
        Ok(row)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.orders.get(&order_id).cloned())
    }

    async fn update_order_status_if(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.orders.get_mut(&order_id) {
            Some(order) if order.status == expected => {
                order.status = next;
                order.updated_at = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(LedgerError::Validation(format!(
                "order {} not found",
                order_id
            ))),
        }
    }

    async fn upsert_product(&self, product: Product) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.products.insert(product.product_id, product);
        Ok(())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.get(&product_id).cloned())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<i64, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        if delta > 0 && inner.fail_next_stock_restore {
            inner.fail_next_stock_restore = false;
            return Err(LedgerError::Database("injected stock failure".into()));
        }
        let product = inner.products.get_mut(&product_id).ok_or_else(|| {
            LedgerError::Validation(format!("product {} not found", product_id))
        })?;
        let next = product.stock + delta;
        if next < 0 {
            return Err(LedgerError::StockUnavailable {
                product_id,
                requested: -delta,
                available: product.stock,
            });
        }
        product.stock = next;
        Ok(next)
    }

    async fn insert_transfer(&self, record: &TransferRecord) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        inner.transfers.push(record.clone());
        Ok(())
    }

    async fn get_transfer_by_cid(
        &self,
        cid: &str,
    ) -> Result<Option<TransferRecord>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .transfers
            .iter()
            .find(|t| t.cid.as_deref() == Some(cid))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxType;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_apply_delta_credits_and_records() {
        let store = MemStore::new();
        store.create_wallet(10).await.unwrap();

        let outcome = store
            .apply_delta(&BalanceDelta::credit(
                AccountId::Wallet(10),
                d("25.00"),
                TxType::AdminRecharge,
                "ref-1",
            ))
            .await
            .unwrap();

        assert_eq!(outcome.new_balance, d("25.00"));
        assert!(!outcome.deduplicated);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_apply_delta_insufficient_funds() {
        let store = MemStore::new();
        store.create_wallet(10).await.unwrap();

        let err = store
            .apply_delta(&BalanceDelta::debit(
                AccountId::Wallet(10),
                d("5.00"),
                TxType::Purchase,
                "ref-2",
            ))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        // Balance untouched, no phantom row
        assert_eq!(
            store.get_wallet(10).await.unwrap().unwrap().balance,
            Decimal::ZERO
        );
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_delta_unknown_wallet() {
        let store = MemStore::new();
        let err = store
            .apply_delta(&BalanceDelta::credit(
                AccountId::Wallet(404),
                d("1.00"),
                TxType::TransferIn,
                "ref-3",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_apply_delta_dedup_by_reference() {
        let store = MemStore::new();
        store.create_wallet(10).await.unwrap();

        let delta =
            BalanceDelta::credit(AccountId::Wallet(10), d("10.00"), TxType::Refund, "ref-4");
        let first = store.apply_delta(&delta).await.unwrap();
        let second = store.apply_delta(&delta).await.unwrap();

        assert!(!first.deduplicated);
        assert!(second.deduplicated);
        assert_eq!(second.tx_id, first.tx_id);
        // Applied once only
        assert_eq!(second.new_balance, d("10.00"));
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_admin_pending_funds_never_negative() {
        let store = MemStore::new();
        store.ensure_admin(d("100")).await.unwrap();

        let err = store
            .update_admin(AdminDelta {
                pending_funds: d("-1"),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "LEDGER_INCONSISTENCY");
    }

    #[tokio::test]
    async fn test_order_status_cas() {
        let store = MemStore::new();
        let order = store
            .insert_order(NewOrder {
                buyer_id: 1,
                seller_id: 2,
                product_id: 3,
                quantity: 1,
                unit_price: d("10"),
                subtotal: d("10"),
                commission: d("0.50"),
                cashback: Decimal::ZERO,
                total_amount: d("10.50"),
                payment_method: crate::models::PaymentMethod::Cash,
                commission_percent: d("5"),
                cashback_percent: d("1.5"),
                reference_id: "ref-5".into(),
            })
            .await
            .unwrap();

        assert!(
            store
                .update_order_status_if(order.order_id, OrderStatus::Pending, OrderStatus::Delivered)
                .await
                .unwrap()
        );
        // Lost race: expected state no longer matches
        assert!(
            !store
                .update_order_status_if(order.order_id, OrderStatus::Pending, OrderStatus::Cancelled)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_stock_guard() {
        let store = MemStore::new();
        store
            .upsert_product(Product {
                product_id: 7,
                seller_id: 2,
                unit_price: d("10"),
                stock: 3,
                physical: true,
            })
            .await
            .unwrap();

        assert_eq!(store.adjust_stock(7, -2).await.unwrap(), 1);
        let err = store.adjust_stock(7, -2).await.unwrap_err();
        assert_eq!(err.code(), "STOCK_UNAVAILABLE");
    }
}
