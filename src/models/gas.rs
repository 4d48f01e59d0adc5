use crate::error::PurchaseError;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// Predicted cost of the `buyTokens` call: raw gas units plus the gas price
/// that converts them into wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub units: U256,
    pub gas_price_wei: U256,
}

impl GasEstimate {
    pub fn new(units: U256, gas_price_wei: U256) -> Self {
        Self {
            units,
            gas_price_wei,
        }
    }

    /// Native-currency cost with a percentage buffer applied, rounded up so
    /// the reserve never understates what the transaction can consume.
    pub fn buffered_cost_wei(&self, buffer_percent: u64) -> Result<U256, PurchaseError> {
        let overflow = || {
            PurchaseError::InvalidInput(format!(
                "gas estimate out of range: {} units at {} wei",
                self.units, self.gas_price_wei
            ))
        };

        let scaled = self
            .units
            .checked_mul(self.gas_price_wei)
            .and_then(|cost| cost.checked_mul(U256::from(buffer_percent)))
            .ok_or_else(overflow)?;

        let (quotient, remainder) = scaled.div_mod(U256::from(100u64));
        if remainder.is_zero() {
            Ok(quotient)
        } else {
            Ok(quotient + U256::one())
        }
    }
}
