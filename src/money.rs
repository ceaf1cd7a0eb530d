//! Money validation and rounding.
//!
//! All monetary values are `rust_decimal::Decimal` with at most 2 decimal
//! places. Derived amounts (commission, cashback) are rounded half-up to
//! 2 places before they ever reach the ledger.

use rust_decimal::prelude::*;

use crate::error::LedgerError;

/// Monetary scale: 2 decimal places everywhere
pub const MONEY_SCALE: u32 = 2;

/// Upper bound for a single ledger movement. Anything larger is a
/// malformed request, not a real marketplace amount.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

/// Round half-up to 2 decimal places.
///
/// `round2(dec!(3.145)) == dec!(3.15)`, `round2(dec!(3.144)) == dec!(3.14)`.
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a caller-supplied positive amount (transfer, recharge, price).
///
/// Rejects zero, negatives, more than 2 decimal places, and absurdly large
/// values.
pub fn validate_amount(value: Decimal) -> Result<(), LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".into(),
        ));
    }
    validate_scale(value)?;
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(LedgerError::Validation("amount too large".into()));
    }
    Ok(())
}

/// Validate that a value carries at most 2 decimal places.
pub fn validate_scale(value: Decimal) -> Result<(), LedgerError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::Validation(format!(
            "amount {} exceeds {} decimal places",
            value, MONEY_SCALE
        )));
    }
    Ok(())
}
