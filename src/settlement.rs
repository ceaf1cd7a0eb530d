//! Order state machine.
//!
//! Drives the purchase lifecycle: creation with payment capture and stock
//! reservation, seller accept/deliver, buyer confirmation (settlement),
//! cancellation with refund, and admin dispute resolution.
//!
//! Multi-step operations are ordered sagas over individual atomic ledger
//! mutations (debit-before-credit, reserve-before-release). A later step
//! never runs after an earlier one failed; settlement steps that moved
//! real money forward are not auto-reversed — the halted state is logged
//! with the order id and step for manual resolution. Only the symmetric
//! transfer path compensates automatically.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info, warn};
use ulid::Ulid;

use crate::clearing::ClearingService;
use crate::commission::{CommissionSettings, compute_order_totals};
use crate::core_types::{AccountId, AuthContext, OrderId, ProductId, Role};
use crate::error::LedgerError;
use crate::ledger::LedgerService;
use crate::models::{NewOrder, Order, OrderStatus, PaymentMethod, TxType};
use crate::notify::{NotificationSink, OrderEvent};
use crate::payment::{CaptureResult, PaymentGateway};
use crate::store::{BalanceDelta, LedgerStore};

/// Checkout input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub payment_method: PaymentMethod,
}

/// Order lifecycle orchestration over the ledger, clearing account,
/// payment gateway and notification sink
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn LedgerStore>,
    ledger: LedgerService,
    clearing: ClearingService,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    settings: CommissionSettings,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
        settings: CommissionSettings,
    ) -> Self {
        Self {
            ledger: LedgerService::new(store.clone()),
            clearing: ClearingService::new(store.clone()),
            store,
            gateway,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &CommissionSettings {
        &self.settings
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, LedgerError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::Validation(format!("order {} not found", order_id)))
    }

    /// Create an order: reserve stock, capture payment, escrow the funds.
    ///
    /// Capture runs before the order row is inserted, so a failed capture
    /// (insufficient wallet balance, declined card) leaves no order and no
    /// ledger row behind.
    pub async fn create_order(
        &self,
        auth: AuthContext,
        req: CreateOrderRequest,
    ) -> Result<Order, LedgerError> {
        if auth.role != Role::Client {
            return Err(LedgerError::Unauthorized(format!(
                "role {} cannot place orders",
                auth.role.as_str()
            )));
        }

        let product = self
            .store
            .get_product(req.product_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(format!("product {} not found", req.product_id))
            })?;
        if product.seller_id == auth.user_id {
            return Err(LedgerError::Validation(
                "buyer cannot purchase their own product".into(),
            ));
        }

        let totals = compute_order_totals(
            product.unit_price,
            req.quantity,
            req.payment_method,
            &self.settings,
        )?;
        let reference_id = Ulid::new().to_string();

        // Physical goods reserve stock up front, for every payment method
        if product.physical {
            self.store
                .adjust_stock(product.product_id, -req.quantity)
                .await?;
        }

        // Capture the payment. Cash and face-to-face orders skip the
        // ledger entirely until confirmation.
        let capture_result = match req.payment_method {
            PaymentMethod::Wallet => {
                self.ledger
                    .apply(
                        BalanceDelta::debit(
                            AccountId::Wallet(auth.user_id),
                            totals.total_amount,
                            TxType::Purchase,
                            reference_id.clone(),
                        )
                        .describe(format!("purchase of product {}", product.product_id))
                        .with_metadata(serde_json::json!({
                            "product_id": product.product_id,
                            "quantity": req.quantity,
                        })),
                    )
                    .await
                    .map(|_| ())
            }
            PaymentMethod::Gateway => {
                match self
                    .gateway
                    .capture(auth.user_id, totals.total_amount, &reference_id)
                    .await
                {
                    Ok(CaptureResult::Captured { processor_ref }) => {
                        info!(%reference_id, %processor_ref, "gateway capture succeeded");
                        Ok(())
                    }
                    Ok(CaptureResult::Declined { reason }) => Err(LedgerError::Validation(
                        format!("payment declined: {}", reason),
                    )),
                    Err(e) => Err(e),
                }
            }
            PaymentMethod::Cash | PaymentMethod::FaceToFace => Ok(()),
        };

        if let Err(e) = capture_result {
            // The capture error stays the caller-visible failure even if
            // the compensating stock restore itself fails
            if product.physical {
                if let Err(restore_err) = self
                    .store
                    .adjust_stock(product.product_id, req.quantity)
                    .await
                {
                    error!(
                        %reference_id,
                        product_id = product.product_id,
                        error = %restore_err,
                        "stock restore failed after capture failure"
                    );
                }
            }
            return Err(e);
        }

        let order = self
            .store
            .insert_order(NewOrder {
                buyer_id: auth.user_id,
                seller_id: product.seller_id,
                product_id: product.product_id,
                quantity: req.quantity,
                unit_price: product.unit_price,
                subtotal: totals.subtotal,
                commission: totals.commission,
                cashback: totals.cashback,
                total_amount: totals.total_amount,
                payment_method: req.payment_method,
                commission_percent: self.settings.customer_commission_percent,
                cashback_percent: self.settings.cashback_percent,
                reference_id: reference_id.clone(),
            })
            .await?;

        if req.payment_method.is_captured() {
            self.clearing.reserve(totals.total_amount).await?;
        }

        info!(
            order_id = order.order_id,
            buyer_id = auth.user_id,
            total_amount = %totals.total_amount,
            payment_method = %req.payment_method,
            "order created"
        );
        self.notifier
            .order_event(OrderEvent::from_order(&order, OrderStatus::Pending))
            .await;
        Ok(order)
    }

    /// Seller accepts a pending order
    pub async fn accept(&self, auth: AuthContext, order_id: OrderId) -> Result<Order, LedgerError> {
        let order = self.get_order(order_id).await?;
        self.require_seller(&auth, &order)?;
        self.transition(order, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
    }

    /// Seller marks a pending or accepted order as delivered
    pub async fn mark_delivered(
        &self,
        auth: AuthContext,
        order_id: OrderId,
    ) -> Result<Order, LedgerError> {
        let order = self.get_order(order_id).await?;
        self.require_seller(&auth, &order)?;

        let from = order.status;
        if !matches!(from, OrderStatus::Pending | OrderStatus::Confirmed) {
            return Err(self.bad_transition(&order, OrderStatus::Delivered));
        }
        self.transition(order, from, OrderStatus::Delivered).await
    }

    /// Buyer confirms receipt: settle funds and complete the order.
    ///
    /// Requires prior `delivered` status. Settlement credits the seller the
    /// subtotal, pays cashback for wallet orders, moves the commission gain
    /// to the admin balance and releases the escrow. Replays after
    /// completion fail the status precondition and cannot double-credit.
    pub async fn confirm(
        &self,
        auth: AuthContext,
        order_id: OrderId,
    ) -> Result<Order, LedgerError> {
        let order = self.get_order(order_id).await?;
        if order.buyer_id != auth.user_id {
            return Err(LedgerError::Unauthorized(format!(
                "user {} is not the buyer of order {}",
                auth.user_id, order_id
            )));
        }
        if order.status != OrderStatus::Delivered {
            return Err(self.bad_transition(&order, OrderStatus::Completed));
        }

        if order.payment_method.is_captured() {
            self.settle_funds(&order).await?;
        }
        self.transition(order, OrderStatus::Delivered, OrderStatus::Completed)
            .await
    }

    /// Buyer cancels a pending order: refund if captured, restore stock
    pub async fn cancel(&self, auth: AuthContext, order_id: OrderId) -> Result<Order, LedgerError> {
        let order = self.get_order(order_id).await?;
        if order.buyer_id != auth.user_id {
            return Err(LedgerError::Unauthorized(format!(
                "user {} is not the buyer of order {}",
                auth.user_id, order_id
            )));
        }
        if order.status != OrderStatus::Pending {
            return Err(self.bad_transition(&order, OrderStatus::Cancelled));
        }

        // Money moves first; the terminal status lands only once the
        // refund is in place, so a failed unwind leaves the order
        // retryable instead of cancelled-but-unrefunded.
        self.unwind_funds(&order).await?;
        self.transition(order, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
    }

    /// Admin dispute resolution: approve mirrors confirm, reject mirrors
    /// cancel, for any non-terminal order regardless of who holds it.
    pub async fn resolve_dispute(
        &self,
        auth: AuthContext,
        order_id: OrderId,
        approve: bool,
    ) -> Result<Order, LedgerError> {
        // Role check precedes any mutation
        if !auth.is_admin() {
            return Err(LedgerError::Unauthorized(
                "dispute resolution requires the admin role".into(),
            ));
        }

        let order = self.get_order(order_id).await?;
        let from = order.status;
        if from.is_terminal() {
            let to = if approve {
                OrderStatus::Completed
            } else {
                OrderStatus::Cancelled
            };
            return Err(self.bad_transition(&order, to));
        }

        if approve {
            if order.payment_method.is_captured() {
                self.settle_funds(&order).await?;
            }
            self.transition(order, from, OrderStatus::Completed).await
        } else {
            self.unwind_funds(&order).await?;
            self.transition(order, from, OrderStatus::Cancelled).await
        }
    }

    // === Internal steps ===

    /// Settlement money steps, in fixed order: seller payout, cashback,
    /// escrow release with commission gain. Halts on the first failure.
    async fn settle_funds(&self, order: &Order) -> Result<(), LedgerError> {
        let metadata = serde_json::json!({ "order_id": order.order_id });

        self.ledger
            .apply(
                BalanceDelta::credit(
                    AccountId::Wallet(order.seller_id),
                    order.subtotal,
                    TxType::SaleIncome,
                    order.reference_id.clone(),
                )
                .describe(format!("sale income for order {}", order.order_id))
                .with_metadata(metadata.clone()),
            )
            .await
            .inspect_err(|e| {
                error!(order_id = order.order_id, step = "sale_income", error = %e,
                       "settlement halted");
            })?;

        if order.cashback > rust_decimal::Decimal::ZERO {
            self.ledger
                .apply(
                    BalanceDelta::credit(
                        AccountId::Wallet(order.buyer_id),
                        order.cashback,
                        TxType::Cashback,
                        order.reference_id.clone(),
                    )
                    .describe(format!("cashback for order {}", order.order_id))
                    .with_metadata(metadata.clone()),
                )
                .await
                .inspect_err(|e| {
                    error!(order_id = order.order_id, step = "cashback", error = %e,
                           "settlement halted");
                })?;
        }

        let admin_gain = order.commission - order.cashback;
        self.clearing
            .release(
                order.total_amount,
                order.commission,
                order.cashback,
                admin_gain,
                &order.reference_id,
            )
            .await
            .inspect_err(|e| {
                error!(order_id = order.order_id, step = "escrow_release", error = %e,
                       "settlement halted");
            })?;

        Ok(())
    }

    /// Cancellation money steps, in fixed order: refund the captured
    /// payment, restore stock, release the escrow claim. Uncaptured orders
    /// only restore stock. Halts on the first failure; the refund row is
    /// deduplicated by reference, so a retry never pays twice.
    async fn unwind_funds(&self, order: &Order) -> Result<(), LedgerError> {
        if order.payment_method.is_captured() {
            match order.payment_method {
                PaymentMethod::Wallet => {
                    self.ledger
                        .apply(
                            BalanceDelta::credit(
                                AccountId::Wallet(order.buyer_id),
                                order.total_amount,
                                TxType::Refund,
                                order.reference_id.clone(),
                            )
                            .describe(format!("refund for cancelled order {}", order.order_id))
                            .with_metadata(serde_json::json!({ "order_id": order.order_id })),
                        )
                        .await
                        .map(|_| ())
                }
                PaymentMethod::Gateway => {
                    self.gateway
                        .refund(order.buyer_id, order.total_amount, &order.reference_id)
                        .await
                }
                _ => Ok(()),
            }
            .inspect_err(|e| {
                error!(order_id = order.order_id, step = "refund", error = %e,
                       "cancellation halted");
            })?;
        }

        let product = self.store.get_product(order.product_id).await?;
        if let Some(product) = product {
            if product.physical {
                self.store
                    .adjust_stock(order.product_id, order.quantity)
                    .await
                    .inspect_err(|e| {
                        error!(order_id = order.order_id, step = "stock_restore", error = %e,
                               "cancellation halted");
                    })?;
            }
        }

        if order.payment_method.is_captured() {
            self.clearing
                .reverse(order.total_amount)
                .await
                .inspect_err(|e| {
                    error!(order_id = order.order_id, step = "escrow_reverse", error = %e,
                           "cancellation halted");
                })?;
        }

        info!(order_id = order.order_id, "order funds unwound");
        Ok(())
    }

    /// CAS status change plus notification. A lost race surfaces as
    /// `InvalidStateTransition`.
    async fn transition(
        &self,
        order: Order,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, LedgerError> {
        if !from.can_transition_to(to) {
            return Err(self.bad_transition(&order, to));
        }

        let updated = self
            .store
            .update_order_status_if(order.order_id, from, to)
            .await?;
        if !updated {
            warn!(order_id = order.order_id, from = %from, to = %to,
                  "status CAS lost a race");
            return Err(self.bad_transition(&order, to));
        }

        info!(order_id = order.order_id, from = %from, to = %to, "order transitioned");
        self.notifier
            .order_event(OrderEvent::from_order(&order, to))
            .await;
        self.get_order(order.order_id).await
    }

    fn require_seller(&self, auth: &AuthContext, order: &Order) -> Result<(), LedgerError> {
        if auth.role != Role::Seller || order.seller_id != auth.user_id {
            return Err(LedgerError::Unauthorized(format!(
                "user {} is not the seller of order {}",
                auth.user_id, order.order_id
            )));
        }
        Ok(())
    }

    fn bad_transition(&self, order: &Order, to: OrderStatus) -> LedgerError {
        LedgerError::InvalidStateTransition {
            order_id: order.order_id,
            from: order.status.as_str(),
            to: to.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::notify::LogNotifier;
    use crate::payment::MockGateway;
    use crate::store::MemStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const BUYER: AuthContext = AuthContext {
        user_id: 10,
        role: Role::Client,
    };
    const SELLER: AuthContext = AuthContext {
        user_id: 20,
        role: Role::Seller,
    };
    const ADMIN: AuthContext = AuthContext {
        user_id: 1,
        role: Role::Admin,
    };

    async fn setup(buyer_balance: &str) -> (Arc<MemStore>, OrderService) {
        let store = Arc::new(MemStore::new());
        store.ensure_admin(d("1000")).await.unwrap();
        store.create_wallet(BUYER.user_id).await.unwrap();
        store.create_wallet(SELLER.user_id).await.unwrap();
        if buyer_balance != "0" {
            store
                .apply_delta(&BalanceDelta::credit(
                    AccountId::Wallet(BUYER.user_id),
                    d(buyer_balance),
                    TxType::AdminRecharge,
                    "seed",
                ))
                .await
                .unwrap();
        }
        store
            .upsert_product(Product {
                product_id: 100,
                seller_id: SELLER.user_id,
                unit_price: d("100"),
                stock: 5,
                physical: true,
            })
            .await
            .unwrap();

        let svc = OrderService::new(
            store.clone(),
            Arc::new(MockGateway::new()),
            Arc::new(LogNotifier),
            CommissionSettings::default(),
        );
        (store, svc)
    }

    fn wallet_order() -> CreateOrderRequest {
        CreateOrderRequest {
            product_id: 100,
            quantity: 2,
            payment_method: PaymentMethod::Wallet,
        }
    }

    #[tokio::test]
    async fn test_create_wallet_order_debits_and_escrows() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, d("210.00"));

        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("290.00"));
        let admin = store.get_admin().await.unwrap();
        assert_eq!(admin.pending_funds, d("210.00"));
        let product = store.get_product(100).await.unwrap().unwrap();
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_nothing_behind() {
        let (store, svc) = setup("50").await;
        let err = svc.create_order(BUYER, wallet_order()).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        // No order, no ledger row beyond the seed, stock restored
        assert!(store.get_order(1).await.unwrap().is_none());
        assert_eq!(store.transaction_count(), 1);
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_full_settlement_flow() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        svc.mark_delivered(SELLER, order.order_id).await.unwrap();
        let order = svc.confirm(BUYER, order.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        // 500 - 210 + 3.15 cashback
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("293.15"));
        let seller = store.get_wallet(SELLER.user_id).await.unwrap().unwrap();
        assert_eq!(seller.balance, d("200.00"));

        let admin = store.get_admin().await.unwrap();
        assert_eq!(admin.pending_funds, d("0.00"));
        assert_eq!(admin.balance, d("1006.85"));
        assert_eq!(admin.total_commissions, d("10.00"));
        assert_eq!(admin.total_cashbacks_paid, d("3.15"));
    }

    #[tokio::test]
    async fn test_confirm_requires_delivered() {
        let (_, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        let err = svc.confirm(BUYER, order.order_id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
    }

    #[tokio::test]
    async fn test_confirm_replay_does_not_double_credit() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();
        svc.confirm(BUYER, order.order_id).await.unwrap();

        let seller_before = store.get_wallet(SELLER.user_id).await.unwrap().unwrap();
        let err = svc.confirm(BUYER, order.order_id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE_TRANSITION");

        let seller_after = store.get_wallet(SELLER.user_id).await.unwrap().unwrap();
        assert_eq!(seller_after.balance, seller_before.balance);
    }

    #[tokio::test]
    async fn test_cancel_round_trip() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        let order = svc.cancel(BUYER, order.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);

        // Refund exactly reverses the debit; stock restored
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("500.00"));
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.get_admin().await.unwrap().pending_funds, d("0.00"));
    }

    #[tokio::test]
    async fn test_high_cashback_settlement_debits_admin() {
        // Cashback rate high enough that the cashback exceeds the
        // commission: the shortfall must come out of the admin balance
        let (store, _) = setup("500").await;
        let svc = OrderService::new(
            store.clone(),
            Arc::new(MockGateway::new()),
            Arc::new(LogNotifier),
            CommissionSettings {
                customer_commission_percent: d("1"),
                cashback_percent: d("5"),
            },
        );
        let order = svc
            .create_order(
                BUYER,
                CreateOrderRequest {
                    product_id: 100,
                    quantity: 1,
                    payment_method: PaymentMethod::Wallet,
                },
            )
            .await
            .unwrap();
        // subtotal 100, commission 1.00, total 101.00, cashback 5.05
        assert_eq!(order.commission, d("1.00"));
        assert_eq!(order.cashback, d("5.05"));

        svc.mark_delivered(SELLER, order.order_id).await.unwrap();
        svc.confirm(BUYER, order.order_id).await.unwrap();

        let admin = store.get_admin().await.unwrap();
        assert_eq!(admin.balance, d("995.95"));
        assert_eq!(admin.pending_funds, d("0.00"));

        // The order's ledger rows net to zero
        let rows = store
            .transactions_by_reference(&order.reference_id)
            .await
            .unwrap();
        let sum: Decimal = rows.iter().map(|t| t.amount).sum();
        assert_eq!(sum, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_cancel_failure_leaves_order_retryable() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        // Refund credit fails: the order must stay pending, not land in a
        // terminal state with the buyer unrefunded
        store.set_fail_next_credit(AccountId::Wallet(BUYER.user_id));
        let err = svc.cancel(BUYER, order.order_id).await.unwrap_err();
        assert_eq!(err.code(), "DATABASE_ERROR");
        let stuck = svc.get_order(order.order_id).await.unwrap();
        assert_eq!(stuck.status, OrderStatus::Pending);
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("290.00"));

        // Retry succeeds and refunds exactly once
        let order = svc.cancel(BUYER, order.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("500.00"));
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 5);
        assert_eq!(store.get_admin().await.unwrap().pending_funds, d("0.00"));
    }

    #[tokio::test]
    async fn test_reject_failure_leaves_order_retryable() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();

        store.set_fail_next_credit(AccountId::Wallet(BUYER.user_id));
        svc.resolve_dispute(ADMIN, order.order_id, false)
            .await
            .unwrap_err();
        let stuck = svc.get_order(order.order_id).await.unwrap();
        assert_eq!(stuck.status, OrderStatus::Delivered);

        let order = svc
            .resolve_dispute(ADMIN, order.order_id, false)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("500.00"));
    }

    #[tokio::test]
    async fn test_capture_error_survives_failed_stock_restore() {
        let (store, svc) = setup("50").await;

        // Both the wallet debit and the compensating stock restore fail;
        // the caller still sees the capture failure
        store.set_fail_next_stock_restore();
        let err = svc.create_order(BUYER, wallet_order()).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        // The restore did run and fail: stock is still reserved
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 3);
        assert!(store.get_order(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_only_from_pending() {
        let (_, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();

        let err = svc.cancel(BUYER, order.order_id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
    }

    #[tokio::test]
    async fn test_cash_order_skips_ledger() {
        let (store, svc) = setup("0").await;
        let order = svc
            .create_order(
                BUYER,
                CreateOrderRequest {
                    product_id: 100,
                    quantity: 1,
                    payment_method: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.transaction_count(), 0);
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 4);

        // Cancel is a pure status change plus stock restoration
        svc.cancel(BUYER, order.order_id).await.unwrap();
        assert_eq!(store.transaction_count(), 0);
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_cash_confirm_is_status_only() {
        let (store, svc) = setup("0").await;
        let order = svc
            .create_order(
                BUYER,
                CreateOrderRequest {
                    product_id: 100,
                    quantity: 1,
                    payment_method: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap();
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();
        let order = svc.confirm(BUYER, order.order_id).await.unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(store.transaction_count(), 0);
        assert_eq!(store.get_admin().await.unwrap().pending_funds, d("0.00"));
    }

    #[tokio::test]
    async fn test_role_checks() {
        let (_, svc) = setup("500").await;

        // Sellers and admins cannot place orders
        assert_eq!(
            svc.create_order(SELLER, wallet_order())
                .await
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );

        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        // Only the seller may mark delivered
        assert_eq!(
            svc.mark_delivered(BUYER, order.order_id)
                .await
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );

        // Only the buyer may confirm
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();
        assert_eq!(
            svc.confirm(SELLER, order.order_id)
                .await
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );
    }

    #[tokio::test]
    async fn test_admin_resolve_approve_settles() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();

        // Approve straight from pending
        let order = svc
            .resolve_dispute(ADMIN, order.order_id, true)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        let seller = store.get_wallet(SELLER.user_id).await.unwrap().unwrap();
        assert_eq!(seller.balance, d("200.00"));
    }

    #[tokio::test]
    async fn test_admin_resolve_reject_refunds() {
        let (store, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        svc.mark_delivered(SELLER, order.order_id).await.unwrap();

        let order = svc
            .resolve_dispute(ADMIN, order.order_id, false)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        let buyer = store.get_wallet(BUYER.user_id).await.unwrap().unwrap();
        assert_eq!(buyer.balance, d("500.00"));
    }

    #[tokio::test]
    async fn test_resolve_requires_admin() {
        let (_, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        assert_eq!(
            svc.resolve_dispute(BUYER, order.order_id, true)
                .await
                .unwrap_err()
                .code(),
            "UNAUTHORIZED"
        );
    }

    #[tokio::test]
    async fn test_resolve_terminal_order_fails() {
        let (_, svc) = setup("500").await;
        let order = svc.create_order(BUYER, wallet_order()).await.unwrap();
        svc.cancel(BUYER, order.order_id).await.unwrap();
        assert_eq!(
            svc.resolve_dispute(ADMIN, order.order_id, true)
                .await
                .unwrap_err()
                .code(),
            "INVALID_STATE_TRANSITION"
        );
    }

    #[tokio::test]
    async fn test_stock_unavailable() {
        let (_, svc) = setup("5000").await;
        let err = svc
            .create_order(
                BUYER,
                CreateOrderRequest {
                    product_id: 100,
                    quantity: 10,
                    payment_method: PaymentMethod::Wallet,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STOCK_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_declined_gateway_leaves_nothing_behind() {
        let (store, _) = setup("0").await;
        let gateway = Arc::new(MockGateway::new());
        gateway.set_decline_all(true);
        let svc = OrderService::new(
            store.clone(),
            gateway,
            Arc::new(LogNotifier),
            CommissionSettings::default(),
        );

        let err = svc
            .create_order(
                BUYER,
                CreateOrderRequest {
                    product_id: 100,
                    quantity: 1,
                    payment_method: PaymentMethod::Gateway,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(store.get_product(100).await.unwrap().unwrap().stock, 5);
        assert!(store.get_order(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cannot_buy_own_product() {
        let (_, svc) = setup("500").await;
        let own_buyer = AuthContext::new(SELLER.user_id, Role::Client);
        let err = svc.create_order(own_buyer, wallet_order()).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
