//! End-to-end settlement scenarios on the in-memory store: the full
//! checkout → deliver → confirm money flow, cancellation round-trips,
//! transfer compensation and conservation checks.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use tijara::clearing::ClearingService;
use tijara::commission::CommissionSettings;
use tijara::core_types::{AccountId, AuthContext, Role};
use tijara::models::{OrderStatus, PaymentMethod, Product, TxType};
use tijara::notify::LogNotifier;
use tijara::payment::MockGateway;
use tijara::settlement::{CreateOrderRequest, OrderService};
use tijara::store::{BalanceDelta, LedgerStore, MemStore};
use tijara::transfer::TransferService;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

const BUYER: AuthContext = AuthContext {
    user_id: 101,
    role: Role::Client,
};
const SELLER: AuthContext = AuthContext {
    user_id: 202,
    role: Role::Seller,
};
const ADMIN: AuthContext = AuthContext {
    user_id: 1,
    role: Role::Admin,
};

struct Harness {
    store: Arc<MemStore>,
    orders: OrderService,
    transfers: TransferService,
    clearing: ClearingService,
}

async fn harness(buyer_balance: &str) -> Harness {
    let store = Arc::new(MemStore::new());
    let clearing = ClearingService::new(store.clone());
    clearing.bootstrap(d("10000")).await.unwrap();

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
            product_id: 7,
            seller_id: SELLER.user_id,
            unit_price: d("100"),
            stock: 10,
            physical: true,
        })
        .await
        .unwrap();

    let orders = OrderService::new(
        store.clone(),
        Arc::new(MockGateway::new()),
        Arc::new(LogNotifier),
        CommissionSettings::default(),
    );
    let transfers = TransferService::new(store.clone());
    Harness {
        store,
        orders,
        transfers,
        clearing,
    }
}

fn wallet_checkout(quantity: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        product_id: 7,
        quantity,
        payment_method: PaymentMethod::Wallet,
    }
}

async fn balance(h: &Harness, user_id: i64) -> Decimal {
    h.store.get_wallet(user_id).await.unwrap().unwrap().balance
}

#[tokio::test]
async fn wallet_order_full_lifecycle() {
    let h = harness("500").await;

    // unit_price=100, qty=2 → subtotal 200, commission 10.00, total 210.00,
    // cashback 3.15, admin gain 6.85
    let order = h.orders.create_order(BUYER, wallet_checkout(2)).await.unwrap();
    assert_eq!(order.subtotal, d("200"));
    assert_eq!(order.commission, d("10.00"));
    assert_eq!(order.total_amount, d("210.00"));
    assert_eq!(order.cashback, d("3.15"));

    assert_eq!(balance(&h, BUYER.user_id).await, d("290.00"));
    assert_eq!(h.clearing.summary().await.unwrap().pending_funds, d("210.00"));

    h.orders.accept(SELLER, order.order_id).await.unwrap();
    h.orders.mark_delivered(SELLER, order.order_id).await.unwrap();
    let order = h.orders.confirm(BUYER, order.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    // Conservation: seller + cashback + admin gain == subtotal + commission
    assert_eq!(balance(&h, SELLER.user_id).await, d("200.00"));
    assert_eq!(balance(&h, BUYER.user_id).await, d("293.15"));
    let admin = h.clearing.summary().await.unwrap();
    assert_eq!(admin.balance, d("10006.85"));
    assert_eq!(admin.pending_funds, d("0.00"));
    assert_eq!(admin.total_commissions, d("10.00"));
    assert_eq!(admin.total_cashbacks_paid, d("3.15"));
}

#[tokio::test]
async fn order_history_reconstructs_from_ledger() {
    let h = harness("500").await;
    let order = h.orders.create_order(BUYER, wallet_checkout(2)).await.unwrap();
    h.orders.mark_delivered(SELLER, order.order_id).await.unwrap();
    h.orders.confirm(BUYER, order.order_id).await.unwrap();

    let rows = h
        .store
        .transactions_by_reference(&order.reference_id)
        .await
        .unwrap();
    let types: Vec<TxType> = rows.iter().map(|r| r.tx_type).collect();
    assert_eq!(
        types,
        vec![
            TxType::Purchase,
            TxType::SaleIncome,
            TxType::Cashback,
            TxType::Commission,
        ]
    );

    // Signed amounts across all parties sum to zero for a settled order:
    // -210 (buyer) +200 (seller) +3.15 (buyer) +6.85 (admin)
    let sum: Decimal = rows.iter().map(|r| r.amount).sum();
    assert_eq!(sum, Decimal::ZERO);
}

#[tokio::test]
async fn insufficient_funds_persists_nothing() {
    let h = harness("50").await;
    let err = h
        .orders
        .create_order(BUYER, wallet_checkout(2))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

    assert!(h.store.get_order(1).await.unwrap().is_none());
    // Only the seed row exists
    assert_eq!(h.store.transaction_count(), 1);
    assert_eq!(h.store.get_product(7).await.unwrap().unwrap().stock, 10);
}

#[tokio::test]
async fn cancel_is_an_exact_round_trip() {
    let h = harness("500").await;
    let before = balance(&h, BUYER.user_id).await;

    let order = h.orders.create_order(BUYER, wallet_checkout(3)).await.unwrap();
    h.orders.cancel(BUYER, order.order_id).await.unwrap();

    assert_eq!(balance(&h, BUYER.user_id).await, before);
    assert_eq!(h.store.get_product(7).await.unwrap().unwrap().stock, 10);
    assert_eq!(h.clearing.summary().await.unwrap().pending_funds, d("0.00"));
}

#[tokio::test]
async fn confirm_replay_fails_without_double_credit() {
    let h = harness("500").await;
    let order = h.orders.create_order(BUYER, wallet_checkout(1)).await.unwrap();
    h.orders.mark_delivered(SELLER, order.order_id).await.unwrap();
    h.orders.confirm(BUYER, order.order_id).await.unwrap();

    let seller_before = balance(&h, SELLER.user_id).await;
    let err = h.orders.confirm(BUYER, order.order_id).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
    assert_eq!(balance(&h, SELLER.user_id).await, seller_before);
}

#[tokio::test]
async fn cash_orders_never_touch_the_ledger() {
    let h = harness("0").await;
    let order = h
        .orders
        .create_order(
            BUYER,
            CreateOrderRequest {
                product_id: 7,
                quantity: 2,
                payment_method: PaymentMethod::FaceToFace,
            },
        )
        .await
        .unwrap();

    assert_eq!(h.store.transaction_count(), 0);

    h.orders.mark_delivered(SELLER, order.order_id).await.unwrap();
    let order = h.orders.confirm(BUYER, order.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(h.store.transaction_count(), 0);
    assert_eq!(h.clearing.summary().await.unwrap().pending_funds, d("0.00"));
}

#[tokio::test]
async fn dispute_reject_refunds_delivered_order() {
    let h = harness("500").await;
    let order = h.orders.create_order(BUYER, wallet_checkout(2)).await.unwrap();
    h.orders.accept(SELLER, order.order_id).await.unwrap();
    h.orders.mark_delivered(SELLER, order.order_id).await.unwrap();

    let order = h
        .orders
        .resolve_dispute(ADMIN, order.order_id, false)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(balance(&h, BUYER.user_id).await, d("500.00"));
    assert_eq!(h.store.get_product(7).await.unwrap().unwrap().stock, 10);
}

#[tokio::test]
async fn failed_transfer_nets_to_zero() {
    let h = harness("150").await;
    h.store.set_fail_next_credit(AccountId::Wallet(SELLER.user_id));

    let err = h
        .transfers
        .transfer(BUYER, SELLER.user_id, d("100"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DATABASE_ERROR");

    // Debit of 100 then rollback credit of 100
    assert_eq!(balance(&h, BUYER.user_id).await, d("150"));
    assert_eq!(balance(&h, SELLER.user_id).await, d("0"));

    // seed + transfer_out + transfer_rollback
    assert_eq!(h.store.transaction_count(), 3);
}

#[tokio::test]
async fn recharge_then_spend() {
    let h = harness("0").await;
    let wallet = h
        .transfers
        .admin_recharge(ADMIN, BUYER.user_id, d("300"))
        .await
        .unwrap();
    assert_eq!(wallet.balance, d("300"));
    assert_eq!(h.clearing.summary().await.unwrap().balance, d("9700"));

    let order = h.orders.create_order(BUYER, wallet_checkout(1)).await.unwrap();
    assert_eq!(order.total_amount, d("105.00"));
    assert_eq!(balance(&h, BUYER.user_id).await, d("195.00"));
}
