use crate::{
    error::PurchaseError,
    models::{units, GasEstimate},
};
use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Point-in-time spendable balance of an account, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceObservation {
    #[serde(with = "units::ether_string")]
    pub amount: U256,
}

impl BalanceObservation {
    pub fn from_wei(amount: U256) -> Self {
        Self { amount }
    }

    /// Builds an observation from a decimal ether string as a wallet would
    /// display it.
    pub fn parse(formatted: &str) -> Result<Self, PurchaseError> {
        units::parse_native(formatted).map(Self::from_wei)
    }
}

/// What the account can spend on the purchase right now.
///
/// `eligible` and `shortfall` always come from the same inputs as
/// `max_spend`; a plan is replaced wholesale, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasePlan {
    #[serde(with = "units::ether_string")]
    pub max_spend: U256,
    pub eligible: bool,
    #[serde(with = "units::ether_string")]
    pub shortfall: U256,
}

impl PurchasePlan {
    pub fn zero() -> Self {
        Self {
            max_spend: U256::zero(),
            eligible: false,
            shortfall: U256::zero(),
        }
    }
}

/// A plan together with the observations it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub account: Address,
    pub plan: PurchasePlan,
    #[serde(with = "units::ether_string")]
    pub balance: U256,
    #[serde(with = "units::ether_string")]
    pub gas_cost: U256,
    pub estimate: Option<GasEstimate>,
    pub computed_at: DateTime<Utc>,
}

/// Latest plan of the purchasing account as served over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStatus {
    #[serde(flatten)]
    pub snapshot: PlanSnapshot,
    /// A purchase by this account completed within the last few seconds.
    pub recent_success: bool,
}
