//! Native-currency amounts are carried as wei in a `U256`; these helpers
//! move between that fixed-point form and decimal ether strings.

use crate::error::PurchaseError;
use ethers::{
    types::U256,
    utils::{format_ether, format_units, parse_ether, parse_units},
};

/// One ether in wei.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Parses a decimal ether amount such as `"0.05"` into wei.
///
/// Negative, empty and non-numeric input (including `NaN`/`inf`) is rejected
/// with [`PurchaseError::InvalidInput`].
pub fn parse_native(input: &str) -> Result<U256, PurchaseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PurchaseError::InvalidInput("empty amount".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(PurchaseError::InvalidInput(format!(
            "negative amount: {}",
            trimmed
        )));
    }
    parse_ether(trimmed)
        .map_err(|e| PurchaseError::InvalidInput(format!("invalid amount {:?}: {}", trimmed, e)))
}

/// Renders wei as a decimal ether string with all 18 decimals.
pub fn format_native(wei: U256) -> String {
    format_ether(wei)
}

/// Parses a decimal token amount into base units of a token with
/// `decimals` decimals.
pub fn parse_token_amount(input: &str, decimals: u8) -> Result<U256, PurchaseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(PurchaseError::InvalidInput(format!(
            "invalid token amount: {:?}",
            trimmed
        )));
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > usize::from(decimals) {
            return Err(PurchaseError::InvalidInput(format!(
                "{} has more than {} decimals",
                trimmed, decimals
            )));
        }
    }
    parse_units(trimmed, u32::from(decimals))
        .map(U256::from)
        .map_err(|e| PurchaseError::InvalidInput(format!("invalid amount {:?}: {}", trimmed, e)))
}

/// Renders base units of a token with `decimals` decimals.
pub fn format_token_amount(amount: U256, decimals: u8) -> Result<String, PurchaseError> {
    format_units(amount, u32::from(decimals))
        .map_err(|e| PurchaseError::InvalidInput(format!("cannot format {}: {}", amount, e)))
}

/// Serde adapter that writes `U256` wei as a decimal ether string.
pub mod ether_string {
    use super::{format_native, parse_native};
    use ethers::types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_native(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_native(&raw).map_err(D::Error::custom)
    }
}
