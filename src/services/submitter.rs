use crate::{
    contracts::UnityToken,
    error::PurchaseError,
    models::{units::format_native, GasEstimate, PlanSnapshot, PurchaseReceipt},
};
use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
};
use std::sync::Arc;

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Connects a local wallet to `rpc_url` for the given chain.
pub fn connect_signer(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Arc<SignerClient>> {
    let provider = Provider::<Http>::try_from(rpc_url)?;
    let wallet = private_key
        .parse::<LocalWallet>()?
        .with_chain_id(chain_id);
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

/// Gas limit never exceeds this multiple of the estimated units.
const MAX_GAS_LIMIT_MULTIPLE: u64 = 2;

/// An authorized purchase: the value to attach and the gas reserve the plan
/// kept back for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub value: U256,
    pub reserve: U256,
    pub estimate: Option<GasEstimate>,
}

/// Gas limit and legacy gas price for the purchase transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTerms {
    pub gas_limit: U256,
    pub gas_price: U256,
}

impl FeeTerms {
    /// Most the transaction can be charged for gas.
    pub fn max_fee(&self) -> U256 {
        self.gas_limit.saturating_mul(self.gas_price)
    }
}

impl PurchaseOrder {
    /// Picks fee terms whose worst case fits inside `reserve`.
    ///
    /// The estimate the plan was computed with takes precedence; `live` is
    /// only used when the plan ran on the fallback reserve.
    pub fn fee_terms(&self, live: Option<GasEstimate>) -> Result<FeeTerms, PurchaseError> {
        let pricing = self.estimate.or(live).ok_or_else(|| {
            PurchaseError::TransactionFailed("no gas price available for purchase".to_string())
        })?;

        let ceiling = pricing
            .units
            .saturating_mul(U256::from(MAX_GAS_LIMIT_MULTIPLE));
        if pricing.gas_price_wei.is_zero() {
            return Ok(FeeTerms {
                gas_limit: ceiling,
                gas_price: U256::zero(),
            });
        }

        let affordable = self.reserve / pricing.gas_price_wei;
        if affordable < pricing.units {
            return Err(PurchaseError::TransactionFailed(format!(
                "{} gas at {} wei exceeds the reserved {} ETH",
                pricing.units,
                pricing.gas_price_wei,
                format_native(self.reserve)
            )));
        }

        Ok(FeeTerms {
            gas_limit: affordable.min(ceiling),
            gas_price: pricing.gas_price_wei,
        })
    }
}

/// Decides whether the latest plan may be sent.
///
/// Eligibility is checked before the network, so a poor account on the
/// wrong chain is told about the missing funds first.
pub fn authorize_purchase(
    snapshot: Option<&PlanSnapshot>,
    chain_id: u64,
    expected_chain_id: u64,
) -> Result<PurchaseOrder, PurchaseError> {
    let snapshot = snapshot.ok_or(PurchaseError::NoBalance)?;

    if !snapshot.plan.eligible {
        return Err(PurchaseError::NotEligible {
            shortfall: format_native(snapshot.plan.shortfall),
        });
    }

    if chain_id != expected_chain_id {
        return Err(PurchaseError::WrongNetwork {
            expected: expected_chain_id,
            actual: chain_id,
        });
    }

    Ok(PurchaseOrder {
        value: snapshot.plan.max_spend,
        reserve: snapshot.gas_cost,
        estimate: snapshot.estimate,
    })
}

#[async_trait]
pub trait PurchaseSender: Send + Sync {
    /// Account the purchase is paid from.
    fn account(&self) -> Address;

    async fn send_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseReceipt, PurchaseError>;
}

pub struct PurchaseSubmitter {
    client: Arc<SignerClient>,
    token_address: Address,
}

impl PurchaseSubmitter {
    pub fn new(client: Arc<SignerClient>, token_address: Address) -> Self {
        Self {
            client,
            token_address,
        }
    }
}

#[async_trait]
impl PurchaseSender for PurchaseSubmitter {
    fn account(&self) -> Address {
        self.client.address()
    }

    async fn send_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseReceipt, PurchaseError> {
        let value = order.value;
        let token = UnityToken::new(self.token_address, self.client.clone());
        let call = token
            .buy_tokens(Vec::new(), Vec::new())
            .value(value)
            .legacy();

        let live = match order.estimate {
            Some(_) => None,
            None => {
                let units = call.estimate_gas().await.map_err(PurchaseError::contract)?;
                let gas_price = self.client.get_gas_price().await.map_err(PurchaseError::contract)?;
                Some(GasEstimate::new(units, gas_price))
            }
        };
        let terms = order.fee_terms(live)?;

        tracing::info!(
            value = %format_native(value),
            gas_limit = %terms.gas_limit,
            gas_price = %terms.gas_price,
            from = ?self.account(),
            "Buying tokens"
        );

        let call = call.gas(terms.gas_limit).gas_price(terms.gas_price);
        let pending_tx = call.send().await.map_err(PurchaseError::contract)?;

        tracing::info!("Purchase sent: {:?}, waiting for confirmation...", pending_tx.tx_hash());

        let receipt = pending_tx
            .await?
            .ok_or_else(|| PurchaseError::TransactionFailed("transaction dropped".to_string()))?;

        if receipt.status != Some(1.into()) {
            return Err(PurchaseError::TransactionFailed(format!(
                "purchase reverted in {:?}",
                receipt.transaction_hash
            )));
        }

        tracing::info!("Purchase confirmed: {:?}", receipt.transaction_hash);

        Ok(PurchaseReceipt {
            tx_hash: receipt.transaction_hash,
            value,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}
