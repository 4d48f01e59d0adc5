use crate::{
    contracts::UnityToken,
    error::PurchaseError,
    models::units::parse_token_amount,
    services::submitter::SignerClient,
};
use async_trait::async_trait;
use ethers::prelude::*;
use std::sync::Arc;

/// Parses a withdrawal amount in whole-token decimal notation into base
/// units.
pub fn parse_withdraw_amount(raw: &str, decimals: u8) -> Result<U256, PurchaseError> {
    let amount = parse_token_amount(raw, decimals)?;
    if amount.is_zero() {
        return Err(PurchaseError::InvalidInput(
            "withdrawal amount must be positive".to_string(),
        ));
    }
    Ok(amount)
}

/// A mined, successful owner transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfirmation {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait Withdrawer: Send + Sync {
    /// Withdraws `amount` base units of the token to the owner.
    async fn withdraw(&self, amount: U256) -> Result<TxConfirmation, PurchaseError>;
}

/// Owner-side operations on the sale contract.
pub struct AdminService {
    client: Arc<SignerClient>,
    token_address: Address,
}

impl AdminService {
    pub fn new(client: Arc<SignerClient>, token_address: Address) -> Self {
        tracing::info!("Admin withdrawals enabled for {:?}", client.address());
        Self {
            client,
            token_address,
        }
    }
}

#[async_trait]
impl Withdrawer for AdminService {
    async fn withdraw(&self, amount: U256) -> Result<TxConfirmation, PurchaseError> {
        let token = UnityToken::new(self.token_address, self.client.clone());
        let call = token.withdraw(amount);
        let pending_tx = call.send().await.map_err(PurchaseError::contract)?;

        let receipt = pending_tx
            .await?
            .ok_or_else(|| PurchaseError::TransactionFailed("transaction dropped".to_string()))?;

        if receipt.status != Some(1.into()) {
            tracing::error!("Withdrawal reverted: {:?}", receipt.transaction_hash);
            return Err(PurchaseError::TransactionFailed(format!(
                "withdrawal reverted in {:?}",
                receipt.transaction_hash
            )));
        }

        tracing::info!(
            "Withdrawal of {} confirmed: {:?}",
            amount,
            receipt.transaction_hash
        );

        Ok(TxConfirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}
