//! External payment gateway seam.
//!
//! Gateway-method orders capture and refund funds outside the wallet
//! ledger. The trait keeps the settlement core testable; production wiring
//! plugs in a real processor client.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core_types::UserId;
use crate::error::LedgerError;

/// Outcome of a capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Funds captured; carries the processor's reference
    Captured { processor_ref: String },
    /// Processor declined the charge
    Declined { reason: String },
}

/// External card/processor integration for gateway-method payments
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the buyer's external payment method
    async fn capture(
        &self,
        buyer_id: UserId,
        amount: Decimal,
        reference_id: &str,
    ) -> Result<CaptureResult, LedgerError>;

    /// Return a previously captured amount to the buyer
    async fn refund(
        &self,
        buyer_id: UserId,
        amount: Decimal,
        reference_id: &str,
    ) -> Result<(), LedgerError>;
}

/// Always-approve gateway for dev mode and tests, with an optional
/// decline switch.
#[derive(Default)]
pub struct MockGateway {
    decline_all: std::sync::atomic::AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_decline_all(&self, decline: bool) {
        self.decline_all
            .store(decline, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn capture(
        &self,
        _buyer_id: UserId,
        _amount: Decimal,
        reference_id: &str,
    ) -> Result<CaptureResult, LedgerError> {
        if self.decline_all.load(std::sync::atomic::Ordering::SeqCst) {
            return Ok(CaptureResult::Declined {
                reason: "card declined".to_string(),
            });
        }
        Ok(CaptureResult::Captured {
            processor_ref: format!("mock-{}", reference_id),
        })
    }

    async fn refund(
        &self,
        _buyer_id: UserId,
        _amount: Decimal,
        _reference_id: &str,
    ) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_mock_gateway_captures_by_default() {
        let gw = MockGateway::new();
        let result = gw.capture(1, Decimal::new(1000, 2), "ref-1").await.unwrap();
        assert!(matches!(result, CaptureResult::Captured { .. }));
    }

    #[tokio::test]
    async fn test_mock_gateway_decline_switch() {
        let gw = MockGateway::new();
        gw.set_decline_all(true);
        let result = gw.capture(1, Decimal::ONE, "ref-2").await.unwrap();
        assert!(matches!(result, CaptureResult::Declined { .. }));
    }
}
