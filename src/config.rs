use crate::{models::units::parse_native, services::PlanPolicy};
use anyhow::{bail, Context, Result};
use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
};
use std::str::FromStr;
use std::time::Duration;

/// Ethereum mainnet, the only network the token is sold on.
pub const MAINNET_CHAIN_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Chain access
    pub eth_rpc_url: String,
    pub eth_rpc_fallback: Option<String>,
    pub eth_ws_url: Option<String>,
    pub expected_chain_id: u64,
    pub token_address: Address,

    // Accounts
    pub purchaser_private_key: Option<String>,
    pub purchaser_address: Option<Address>,
    pub admin_private_key: Option<String>,

    // Bearer tokens for the signing routes
    pub api_key: Option<String>,
    pub admin_api_key: Option<String>,

    // Purchase planning
    pub policy: PlanPolicy,
    pub debounce_window: Duration,
    pub balance_poll_interval: Duration,

    // Redis
    pub redis_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = Self::parse_environment(&var("ENVIRONMENT", "development"))?;

        let policy = PlanPolicy {
            min_purchase: parse_native(&var("MIN_PURCHASE_ETH", "0.05"))
                .context("Invalid MIN_PURCHASE_ETH")?,
            fallback_gas_cost: parse_native(&var("FALLBACK_GAS_COST_ETH", "0.01"))
                .context("Invalid FALLBACK_GAS_COST_ETH")?,
            gas_buffer_percent: var("GAS_BUFFER_PERCENT", "110")
                .parse()
                .context("Invalid GAS_BUFFER_PERCENT")?,
        };

        let config = Self {
            environment,
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "8080").parse().context("Invalid PORT")?,

            eth_rpc_url: lookup("ETH_RPC_URL").context("ETH_RPC_URL required")?,
            eth_rpc_fallback: lookup("ETH_RPC_FALLBACK"),
            eth_ws_url: lookup("ETH_WS_URL"),
            expected_chain_id: var("CHAIN_ID", "1").parse().context("Invalid CHAIN_ID")?,
            token_address: Self::parse_address(
                "TOKEN_ADDRESS",
                lookup("TOKEN_ADDRESS").as_deref(),
            )?
            .context("TOKEN_ADDRESS required")?,

            purchaser_private_key: lookup("PURCHASER_PRIVATE_KEY"),
            purchaser_address: Self::parse_address(
                "PURCHASER_ADDRESS",
                lookup("PURCHASER_ADDRESS").as_deref(),
            )?,
            admin_private_key: lookup("ADMIN_PRIVATE_KEY"),

            api_key: lookup("API_KEY").filter(|key| !key.is_empty()),
            admin_api_key: lookup("ADMIN_API_KEY").filter(|key| !key.is_empty()),

            policy,
            debounce_window: Duration::from_millis(
                var("DEBOUNCE_MS", "500").parse().context("Invalid DEBOUNCE_MS")?,
            ),
            balance_poll_interval: Duration::from_secs(
                var("BALANCE_POLL_SECS", "12")
                    .parse()
                    .context("Invalid BALANCE_POLL_SECS")?,
            ),

            redis_url: var("REDIS_URL", "redis://localhost:6379"),
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(env: &str) -> Result<Environment> {
        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_address(var: &str, value: Option<&str>) -> Result<Option<Address>> {
        value
            .map(|raw| {
                Address::from_str(raw.trim()).with_context(|| format!("Invalid address for {}", var))
            })
            .transpose()
    }

    fn validate(&self) -> Result<()> {
        if !self.eth_rpc_url.starts_with("http") {
            bail!("ETH_RPC_URL must be HTTP(S) URL");
        }
        if let Some(ws) = &self.eth_ws_url {
            if !ws.starts_with("ws") {
                bail!("ETH_WS_URL must be a WS(S) URL");
            }
        }

        for (name, key) in [
            ("PURCHASER_PRIVATE_KEY", &self.purchaser_private_key),
            ("ADMIN_PRIVATE_KEY", &self.admin_private_key),
        ] {
            if let Some(key) = key {
                if !key.starts_with("0x") {
                    bail!("{} must start with 0x", name);
                }
            }
        }

        if self.purchaser_private_key.is_some() && self.api_key.is_none() {
            bail!("API_KEY required when PURCHASER_PRIVATE_KEY is set");
        }
        if self.admin_private_key.is_some() && self.admin_api_key.is_none() {
            bail!("ADMIN_API_KEY required when ADMIN_PRIVATE_KEY is set");
        }

        if let (Some(key), Some(address)) = (&self.purchaser_private_key, self.purchaser_address) {
            let wallet = key
                .parse::<LocalWallet>()
                .context("Invalid PURCHASER_PRIVATE_KEY")?;
            if wallet.address() != address {
                bail!(
                    "PURCHASER_ADDRESS {:?} does not match PURCHASER_PRIVATE_KEY account {:?}",
                    address,
                    wallet.address()
                );
            }
        }

        if self.policy.gas_buffer_percent < 100 {
            bail!("GAS_BUFFER_PERCENT must be at least 100");
        }
        if self.debounce_window.is_zero() {
            bail!("DEBOUNCE_MS must be positive");
        }
        if self.balance_poll_interval.is_zero() {
            bail!("BALANCE_POLL_SECS must be positive");
        }

        if self.expected_chain_id != MAINNET_CHAIN_ID && self.environment == Environment::Production
        {
            tracing::warn!(
                "Production environment configured for chain {}",
                self.expected_chain_id
            );
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }

    pub fn network_name(&self) -> String {
        match self.expected_chain_id {
            MAINNET_CHAIN_ID => "Ethereum Mainnet".to_string(),
            11155111 => "Sepolia".to_string(),
            other => format!("Chain {}", other),
        }
    }
}
