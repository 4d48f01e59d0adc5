//! Maximum affordable purchase.
//!
//! Everything here is pure: the same balance and gas estimate always give
//! the same [`PurchasePlan`].

use crate::{
    error::PurchaseError,
    models::{BalanceObservation, GasEstimate, PurchasePlan},
};
use ethers::types::U256;

/// Smallest spend the contract sale accepts: 0.05 ETH.
pub const MIN_PURCHASE_WEI: u128 = 50_000_000_000_000_000;

/// Gas reserve used while no estimate is available: 0.01 ETH.
pub const FALLBACK_GAS_COST_WEI: u128 = 10_000_000_000_000_000;

/// Gas estimates are reserved at 110% of the raw figure.
pub const GAS_BUFFER_PERCENT: u64 = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPolicy {
    pub min_purchase: U256,
    pub fallback_gas_cost: U256,
    pub gas_buffer_percent: u64,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            min_purchase: U256::from(MIN_PURCHASE_WEI),
            fallback_gas_cost: U256::from(FALLBACK_GAS_COST_WEI),
            gas_buffer_percent: GAS_BUFFER_PERCENT,
        }
    }
}

impl PlanPolicy {
    /// Wei to hold back for gas. A missing estimate is not an error, the
    /// fallback reserve is used instead.
    pub fn gas_cost(&self, estimate: Option<&GasEstimate>) -> Result<U256, PurchaseError> {
        match estimate {
            Some(estimate) => estimate.buffered_cost_wei(self.gas_buffer_percent),
            None => Ok(self.fallback_gas_cost),
        }
    }

    pub fn compute(
        &self,
        balance: &BalanceObservation,
        estimate: Option<&GasEstimate>,
    ) -> Result<PurchasePlan, PurchaseError> {
        let gas_cost = self.gas_cost(estimate)?;
        self.plan_for_gas_cost(balance.amount, gas_cost)
    }

    /// Plan for a gas cost already expressed in wei.
    pub fn plan_for_gas_cost(
        &self,
        balance: U256,
        gas_cost: U256,
    ) -> Result<PurchasePlan, PurchaseError> {
        let total_required = gas_cost.checked_add(self.min_purchase).ok_or_else(|| {
            PurchaseError::InvalidInput(format!("gas cost out of range: {} wei", gas_cost))
        })?;

        let max_spend = balance.saturating_sub(gas_cost);

        Ok(PurchasePlan {
            max_spend,
            eligible: max_spend > self.min_purchase,
            shortfall: total_required.saturating_sub(balance),
        })
    }
}

/// [`PlanPolicy::compute`] with the default mainnet rules.
pub fn compute(
    balance: &BalanceObservation,
    estimate: Option<&GasEstimate>,
) -> Result<PurchasePlan, PurchaseError> {
    PlanPolicy::default().compute(balance, estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::units::parse_native;

    fn eth(amount: &str) -> U256 {
        parse_native(amount).unwrap()
    }

    fn balance(amount: &str) -> BalanceObservation {
        BalanceObservation::parse(amount).unwrap()
    }

    #[test]
    fn comfortable_balance_is_eligible() {
        let plan = compute(&balance("1.0"), None).unwrap();
        assert_eq!(plan.max_spend, eth("0.99"));
        assert!(plan.eligible);
        assert_eq!(plan.shortfall, U256::zero());
    }

    #[test]
    fn small_balance_reports_shortfall() {
        let plan = compute(&balance("0.03"), None).unwrap();
        assert_eq!(plan.max_spend, eth("0.02"));
        assert!(!plan.eligible);
        assert_eq!(plan.shortfall, eth("0.03"));
    }

    #[test]
    fn empty_balance_needs_gas_plus_minimum() {
        let plan = compute(&balance("0"), None).unwrap();
        assert_eq!(plan.max_spend, U256::zero());
        assert!(!plan.eligible);
        assert_eq!(plan.shortfall, eth("0.06"));
    }

    #[test]
    fn negative_balance_is_rejected() {
        assert!(matches!(
            BalanceObservation::parse("-0.5"),
            Err(PurchaseError::InvalidInput(_))
        ));
    }

    #[test]
    fn spend_equal_to_minimum_is_not_eligible() {
        let policy = PlanPolicy::default();
        let plan = policy
            .plan_for_gas_cost(eth("0.06"), eth("0.01"))
            .unwrap();
        assert_eq!(plan.max_spend, policy.min_purchase);
        assert!(!plan.eligible);
        assert_eq!(plan.shortfall, U256::zero());

        let one_wei_more = policy
            .plan_for_gas_cost(eth("0.06") + U256::one(), eth("0.01"))
            .unwrap();
        assert!(one_wei_more.eligible);
    }

    #[test]
    fn gas_larger_than_balance_clamps_to_zero() {
        let plan = PlanPolicy::default()
            .plan_for_gas_cost(eth("0.004"), eth("0.01"))
            .unwrap();
        assert_eq!(plan.max_spend, U256::zero());
        assert_eq!(plan.shortfall, eth("0.056"));
    }

    #[test]
    fn estimate_replaces_fallback_with_buffered_cost() {
        // 100k gas at 50 gwei is 0.005 ETH, reserved as 0.0055 ETH
        let estimate = GasEstimate::new(U256::from(100_000u64), U256::from(50_000_000_000u64));
        let plan = compute(&balance("1"), Some(&estimate)).unwrap();
        assert_eq!(plan.max_spend, eth("0.9945"));
        assert!(plan.eligible);
        assert_eq!(plan.shortfall, U256::zero());
    }

    #[test]
    fn recomputing_same_inputs_gives_same_plan() {
        let estimate = GasEstimate::new(U256::from(90_000u64), U256::from(30_000_000_000u64));
        let observation = balance("0.0512");
        let first = compute(&observation, Some(&estimate)).unwrap();
        let second = compute(&observation, Some(&estimate)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_gas_cost_is_invalid_input() {
        let result = PlanPolicy::default().plan_for_gas_cost(eth("1"), U256::MAX);
        assert!(matches!(result, Err(PurchaseError::InvalidInput(_))));
    }
}
