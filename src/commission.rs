//! Commission and cashback calculation.
//!
//! Pure arithmetic, no I/O: given a price, quantity, payment method and the
//! current rate configuration, derive what the buyer pays, what the platform
//! keeps and what flows back as cashback. Rates are percentages
//! (`5` = 5%). Results are rounded half-up to 2 decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::models::PaymentMethod;
use crate::money::round2;

/// Current rate configuration.
///
/// Read-only to the ledger. The resolved rates are frozen into each order
/// at creation time, so later changes never alter existing orders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommissionSettings {
    /// Fee added on top of the product price, paid by the buyer (%)
    pub customer_commission_percent: Decimal,
    /// Rebate to the buyer for wallet-method payments (%)
    pub cashback_percent: Decimal,
}

impl Default for CommissionSettings {
    fn default() -> Self {
        Self {
            customer_commission_percent: Decimal::new(5, 0),
            cashback_percent: Decimal::new(15, 1), // 1.5%
        }
    }
}

/// Monetary breakdown of one order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    /// unit_price * quantity
    pub subtotal: Decimal,
    /// round2(subtotal * commission_rate / 100)
    pub commission: Decimal,
    /// subtotal + commission; what the buyer pays
    pub total_amount: Decimal,
    /// round2(total_amount * cashback_rate / 100) for wallet payments, else 0
    pub cashback: Decimal,
    /// commission - cashback; net platform revenue
    pub admin_gain: Decimal,
}

/// Compute the full monetary breakdown for an order.
///
/// Commission is additive on top of the subtotal, not deducted from the
/// seller's price. Cashback incentivizes wallet payments only.
///
/// # Errors
/// `Validation` for non-positive price or quantity.
pub fn compute_order_totals(
    unit_price: Decimal,
    quantity: i64,
    payment_method: PaymentMethod,
    settings: &CommissionSettings,
) -> Result<OrderTotals, LedgerError> {
    if unit_price <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "unit price must be greater than zero".into(),
        ));
    }
    if quantity <= 0 {
        return Err(LedgerError::Validation(
            "quantity must be greater than zero".into(),
        ));
    }

    let hundred = Decimal::ONE_HUNDRED;
    let subtotal = unit_price * Decimal::from(quantity);
    let commission = round2(subtotal * settings.customer_commission_percent / hundred);
    let total_amount = subtotal + commission;
    let cashback = if payment_method == PaymentMethod::Wallet {
        round2(total_amount * settings.cashback_percent / hundred)
    } else {
        Decimal::ZERO
    };
    let admin_gain = commission - cashback;

    Ok(OrderTotals {
        subtotal,
        commission,
        total_amount,
        cashback,
        admin_gain,
    })
}
