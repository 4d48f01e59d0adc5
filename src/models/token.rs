use crate::models::units;
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_NAME: &str = "Unity Token";
pub const DEFAULT_TOKEN_SYMBOL: &str = "UNT";
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn fallback(address: Address) -> Self {
        Self {
            address,
            name: DEFAULT_TOKEN_NAME.to_string(),
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

/// Token details as presented to buyers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(flatten)]
    pub metadata: TokenMetadata,
    pub price: String,
    pub network: String,
    pub chain_id: u64,
}

/// Emitted by the contract for every completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEvent {
    pub buyer: Address,
    #[serde(with = "units::ether_string")]
    pub eth_amount: U256,
    #[serde(with = "units::ether_string")]
    pub token_amount: U256,
    pub tx_hash: Option<H256>,
    pub block_number: Option<u64>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub tx_hash: H256,
    #[serde(with = "units::ether_string")]
    pub value: U256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub amount: String,
}

/// Token amounts are decimal strings scaled by the token's `decimals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub tx_hash: H256,
    pub amount: String,
    pub decimals: u8,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractBalance {
    pub token: Address,
    pub symbol: String,
    pub decimals: u8,
    pub balance: String,
}
