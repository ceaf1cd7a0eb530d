//! Data models for the wallet ledger and order settlement core.
//!
//! Enum discriminants are stored as SMALLINT in PostgreSQL; every enum has
//! an `id()` / `from_id()` pair so rows round-trip without stringly-typed
//! columns.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, OrderId, ProductId, TxId, UserId};

// ============================================================================
// Ledger transaction types
// ============================================================================

/// Business meaning of one ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum TxType {
    /// Buyer debit at checkout (wallet payment)
    Purchase = 1,
    /// Seller credit on settlement (price excluding commission)
    SaleIncome = 2,
    /// Buyer rebate for wallet-method payments, paid on settlement
    Cashback = 3,
    /// Full refund of a captured payment (unconditional credit)
    Refund = 4,
    /// Admin-to-user wallet top-up
    AdminRecharge = 5,
    /// Peer transfer credit leg
    TransferIn = 6,
    /// Peer transfer debit leg
    TransferOut = 7,
    /// Compensating credit after a failed transfer credit leg
    TransferRollback = 8,
    /// Platform commission income on the admin account
    Commission = 9,
}

impl TxType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxType::Purchase),
            2 => Some(TxType::SaleIncome),
            3 => Some(TxType::Cashback),
            4 => Some(TxType::Refund),
            5 => Some(TxType::AdminRecharge),
            6 => Some(TxType::TransferIn),
            7 => Some(TxType::TransferOut),
            8 => Some(TxType::TransferRollback),
            9 => Some(TxType::Commission),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Purchase => "purchase",
            TxType::SaleIncome => "sale_income",
            TxType::Cashback => "cashback",
            TxType::Refund => "refund",
            TxType::AdminRecharge => "admin_recharge",
            TxType::TransferIn => "transfer_in",
            TxType::TransferOut => "transfer_out",
            TxType::TransferRollback => "transfer_rollback",
            TxType::Commission => "commission",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of one balance mutation. Append-only; never updated
/// or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerTransaction {
    pub tx_id: TxId,
    pub account: AccountId,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    /// Free-form context: order id, counterparty, step
    pub metadata: serde_json::Value,
    /// Correlates all rows belonging to one business event (ULID)
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Wallets and the admin clearing account
// ============================================================================

/// Per-user wallet. One per user, created at registration with balance 0.
/// Mutated only through the ledger primitive.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Singleton admin clearing account.
///
/// `balance` is withdrawable money; `pending_funds` is escrow for orders
/// awaiting confirmation. Lifetime counters are monotonic.
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccount {
    pub balance: Decimal,
    pub pending_funds: Decimal,
    pub total_commissions: Decimal,
    pub total_cashbacks_paid: Decimal,
    pub total_transactions: i64,
    pub updated_at: DateTime<Utc>,
}

/// Field increments applied to the admin account in one atomic update.
///
/// Zero fields are no-ops; `pending_funds` going negative is rejected by
/// the store as a `LedgerInconsistency`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminDelta {
    pub balance: Decimal,
    pub pending_funds: Decimal,
    pub total_commissions: Decimal,
    pub total_cashbacks_paid: Decimal,
    pub total_transactions: i64,
}

// ============================================================================
// Orders
// ============================================================================

/// How the buyer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum PaymentMethod {
    Wallet = 1,
    Gateway = 2,
    Cash = 3,
    FaceToFace = 4,
}

impl PaymentMethod {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(PaymentMethod::Wallet),
            2 => Some(PaymentMethod::Gateway),
            3 => Some(PaymentMethod::Cash),
            4 => Some(PaymentMethod::FaceToFace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Cash => "cash",
            PaymentMethod::FaceToFace => "face_to_face",
        }
    }

    /// Whether funds are captured up front and escrowed at the admin
    /// account. Cash and face-to-face orders never touch the ledger.
    #[inline]
    pub fn is_captured(&self) -> bool {
        matches!(self, PaymentMethod::Wallet | PaymentMethod::Gateway)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order lifecycle states.
///
/// `Completed` and `Cancelled` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum OrderStatus {
    Pending = 0,
    /// Seller accepted the order
    Confirmed = 10,
    /// Seller marked the order delivered; buyer may now settle
    Delivered = 20,
    /// Terminal: funds released to seller, cashback paid
    Completed = 30,
    /// Terminal: refunded (if captured) and stock restored
    Cancelled = -10,
}

impl OrderStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(OrderStatus::Pending),
            10 => Some(OrderStatus::Confirmed),
            20 => Some(OrderStatus::Delivered),
            30 => Some(OrderStatus::Completed),
            -10 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Static transition table. CAS updates enforce this again at the
    /// storage layer; this is the first gate.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Pending, Delivered) | (Pending, Cancelled) => true,
            // Admin approve may settle a captured order straight from Pending
            (Pending, Completed) => true,
            (Confirmed, Delivered) | (Confirmed, Completed) | (Confirmed, Cancelled) => true,
            (Delivered, Completed) | (Delivered, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One purchase attempt. Created on checkout, mutated only by the order
/// state machine, never deleted (cancelled orders are kept for audit).
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub commission: Decimal,
    pub cashback: Decimal,
    /// subtotal + commission; what the buyer pays
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Rate snapshot frozen at creation; settings changes never alter
    /// existing orders
    pub commission_percent: Decimal,
    pub cashback_percent: Decimal,
    /// Correlation key shared by every ledger row of this order
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order fields known before insertion
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub commission: Decimal,
    pub cashback: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub commission_percent: Decimal,
    pub cashback_percent: Decimal,
    pub reference_id: String,
}

/// Catalog entry, reduced to what settlement needs: owner, price and stock
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub unit_price: Decimal,
    pub stock: i64,
    /// Physical goods reserve stock; digital goods skip stock handling
    pub physical: bool,
}

// ============================================================================
// Transfers
// ============================================================================

/// Outcome state of a two-step transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum TransferState {
    /// Debit and credit both applied
    Committed = 1,
    /// Debit applied, credit failed, compensating credit applied
    RolledBack = 2,
    /// Rejected before any funds moved
    Failed = 3,
}

impl TransferState {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransferState::Committed),
            2 => Some(TransferState::RolledBack),
            3 => Some(TransferState::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Committed => "committed",
            TransferState::RolledBack => "rolled_back",
            TransferState::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of one transfer attempt, committed or not
#[derive(Debug, Clone, Serialize)]
pub struct TransferRecord {
    pub reference_id: String,
    /// Client idempotency key; a repeated cid returns the original outcome
    pub cid: Option<String>,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: Decimal,
    pub state: TransferState,
    pub created_at: DateTime<Utc>,
}
