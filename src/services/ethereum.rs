use crate::{
    contracts::UnityToken,
    error::PurchaseError,
    models::{GasEstimate, TokenMetadata},
    services::{CacheService, ChainState},
};
use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
};
use std::sync::Arc;
use std::time::Duration;

const METADATA_TTL: Duration = Duration::from_secs(3600);

pub struct EthereumService {
    primary: Arc<Provider<Http>>,
    fallback: Option<Arc<Provider<Http>>>,
    token_address: Address,
    cache: Arc<CacheService>,
}

impl EthereumService {
    pub async fn new(
        rpc_url: &str,
        fallback_url: Option<&str>,
        token_address: Address,
        cache: Arc<CacheService>,
    ) -> Result<Self> {
        let primary = Arc::new(Provider::<Http>::try_from(rpc_url)?);

        let fallback = if let Some(url) = fallback_url {
            Some(Arc::new(Provider::<Http>::try_from(url)?))
        } else {
            None
        };

        let block_number = primary.get_block_number().await?;
        tracing::info!("Ethereum RPC connected, current block: {}", block_number);

        Ok(Self {
            primary,
            fallback,
            token_address,
            cache,
        })
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    fn token(&self) -> UnityToken<Provider<Http>> {
        UnityToken::new(self.token_address, self.primary.clone())
    }

    async fn gas_price(&self) -> Result<U256, PurchaseError> {
        match self.primary.get_gas_price().await {
            Ok(price) => Ok(price),
            Err(_) if self.fallback.is_some() => {
                tracing::warn!("Primary RPC failed, trying fallback for gas price");
                self.fallback_provider()?
                    .get_gas_price()
                    .await
                    .map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn fallback_provider(&self) -> Result<&Provider<Http>, PurchaseError> {
        self.fallback
            .as_deref()
            .ok_or_else(|| PurchaseError::ConfigError("no fallback RPC configured".to_string()))
    }

    async fn fetch_metadata(&self) -> TokenMetadata {
        let token = self.token();
        let name_call = token.name();
        let symbol_call = token.symbol();
        let decimals_call = token.decimals();
        let (name, symbol, decimals) = futures::join!(
            name_call.call(),
            symbol_call.call(),
            decimals_call.call()
        );

        let mut metadata = TokenMetadata::fallback(self.token_address);
        match name {
            Ok(name) => metadata.name = name,
            Err(e) => tracing::warn!("Token name() failed: {}, using default", e),
        }
        match symbol {
            Ok(symbol) => metadata.symbol = symbol,
            Err(e) => tracing::warn!("Token symbol() failed: {}, using default", e),
        }
        match decimals {
            Ok(decimals) => metadata.decimals = decimals,
            Err(e) => tracing::warn!("Token decimals() failed: {}, using default", e),
        }
        metadata
    }
}

#[async_trait]
impl ChainState for EthereumService {
    async fn chain_id(&self) -> Result<u64, PurchaseError> {
        match self.primary.get_chainid().await {
            Ok(id) => Ok(id.as_u64()),
            Err(_) if self.fallback.is_some() => self
                .fallback_provider()?
                .get_chainid()
                .await
                .map(|id| id.as_u64())
                .map_err(Into::into),
            Err(e) => Err(e.into()),
        }
    }

    async fn block_number(&self) -> Result<u64, PurchaseError> {
        match self.primary.get_block_number().await {
            Ok(num) => Ok(num.as_u64()),
            Err(_) if self.fallback.is_some() => self
                .fallback_provider()?
                .get_block_number()
                .await
                .map(|n| n.as_u64())
                .map_err(Into::into),
            Err(e) => Err(e.into()),
        }
    }

    async fn native_balance(&self, account: Address) -> Result<U256, PurchaseError> {
        match self.primary.get_balance(account, None).await {
            Ok(balance) => Ok(balance),
            Err(_) if self.fallback.is_some() => {
                tracing::warn!("Primary RPC failed, trying fallback for balance of {:?}", account);
                self.fallback_provider()?
                    .get_balance(account, None)
                    .await
                    .map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn estimate_purchase_gas(
        &self,
        from: Address,
        value: U256,
    ) -> Result<Option<GasEstimate>, PurchaseError> {
        let token = self.token();
        let call = token
            .buy_tokens(Vec::new(), Vec::new())
            .from(from)
            .value(value);

        let units = match call.estimate_gas().await {
            Ok(units) => units,
            Err(e) => {
                tracing::warn!(
                    "Gas estimation for buyTokens({}) failed: {}, falling back to reserve",
                    value,
                    e
                );
                return Ok(None);
            }
        };

        let gas_price = match self.gas_price().await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Gas price unavailable: {}, falling back to reserve", e);
                return Ok(None);
            }
        };

        tracing::debug!("Estimated buyTokens gas: {} units at {} wei", units, gas_price);

        Ok(Some(GasEstimate::new(units, gas_price)))
    }

    async fn token_metadata(&self) -> Result<TokenMetadata, PurchaseError> {
        let cache_key = format!("token:{:?}", self.token_address);
        if let Some(cached) = self.cache.get::<TokenMetadata>(&cache_key).await {
            return Ok(cached);
        }

        let metadata = self.fetch_metadata().await;

        self.cache
            .set(&cache_key, &metadata, METADATA_TTL)
            .await
            .map_err(|e| PurchaseError::CacheError(e.to_string()))?;

        Ok(metadata)
    }

    async fn contract_token_balance(&self) -> Result<U256, PurchaseError> {
        self.token()
            .balance_of(self.token_address)
            .call()
            .await
            .map_err(PurchaseError::contract)
    }
}
