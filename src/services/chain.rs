use crate::{
    error::PurchaseError,
    models::{GasEstimate, TokenMetadata},
};
use async_trait::async_trait;
use ethers::types::{Address, U256};

/// Read access to the chain and the token contract.
#[async_trait]
pub trait ChainState: Send + Sync {
    async fn chain_id(&self) -> Result<u64, PurchaseError>;

    async fn block_number(&self) -> Result<u64, PurchaseError>;

    /// Spendable native balance of `account`, in wei.
    async fn native_balance(&self, account: Address) -> Result<U256, PurchaseError>;

    /// Gas needed for `buyTokens` sent from `from` with `value` attached.
    ///
    /// `Ok(None)` means no estimate could be produced, which callers treat
    /// as "use the fallback reserve" rather than as a failure.
    async fn estimate_purchase_gas(
        &self,
        from: Address,
        value: U256,
    ) -> Result<Option<GasEstimate>, PurchaseError>;

    async fn token_metadata(&self) -> Result<TokenMetadata, PurchaseError>;

    /// Tokens held by the sale contract itself.
    async fn contract_token_balance(&self) -> Result<U256, PurchaseError>;
}
