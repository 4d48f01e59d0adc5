#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unt_purchase::{
    error::PurchaseError,
    handlers::AppState,
    models::{units::parse_native, GasEstimate, PurchaseReceipt, TokenMetadata},
    services::{
        Activity, CacheService, ChainState, PlanPolicy, PurchaseOrder, PurchasePlanner,
        PurchaseSender, PurchaseWatcher, TxConfirmation, Withdrawer,
    },
};

pub const TOKEN: Address = Address::repeat_byte(0x70);
pub const BUYER: Address = Address::repeat_byte(0x11);
pub const PURCHASE_KEY: &str = "buyer-secret";
pub const ADMIN_KEY: &str = "admin-secret";

pub fn eth(amount: &str) -> U256 {
    parse_native(amount).unwrap()
}

pub struct MockChain {
    pub chain_id: u64,
    pub balance: U256,
    pub estimate: Option<GasEstimate>,
    pub decimals: u8,
    /// Base units of the token held by the contract.
    pub token_balance: U256,
}

impl MockChain {
    pub fn mainnet(balance: &str) -> Self {
        Self {
            chain_id: 1,
            balance: eth(balance),
            estimate: None,
            decimals: 18,
            token_balance: eth("1000"),
        }
    }
}

#[async_trait]
impl ChainState for MockChain {
    async fn chain_id(&self) -> Result<u64, PurchaseError> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64, PurchaseError> {
        Ok(19_000_000)
    }

    async fn native_balance(&self, _account: Address) -> Result<U256, PurchaseError> {
        Ok(self.balance)
    }

    async fn estimate_purchase_gas(
        &self,
        _from: Address,
        _value: U256,
    ) -> Result<Option<GasEstimate>, PurchaseError> {
        Ok(self.estimate)
    }

    async fn token_metadata(&self) -> Result<TokenMetadata, PurchaseError> {
        Ok(TokenMetadata {
            decimals: self.decimals,
            ..TokenMetadata::fallback(TOKEN)
        })
    }

    async fn contract_token_balance(&self) -> Result<U256, PurchaseError> {
        Ok(self.token_balance)
    }
}

#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<PurchaseOrder>>,
}

impl RecordingSender {
    pub fn values(&self) -> Vec<U256> {
        self.sent.lock().unwrap().iter().map(|order| order.value).collect()
    }
}

#[async_trait]
impl PurchaseSender for RecordingSender {
    fn account(&self) -> Address {
        BUYER
    }

    async fn send_purchase(&self, order: &PurchaseOrder) -> Result<PurchaseReceipt, PurchaseError> {
        self.sent.lock().unwrap().push(*order);
        Ok(PurchaseReceipt {
            tx_hash: H256::repeat_byte(0xab),
            value: order.value,
            block_number: Some(19_000_001),
        })
    }
}

#[derive(Default)]
pub struct RecordingWithdrawer {
    pub withdrawn: Mutex<Vec<U256>>,
}

#[async_trait]
impl Withdrawer for RecordingWithdrawer {
    async fn withdraw(&self, amount: U256) -> Result<TxConfirmation, PurchaseError> {
        self.withdrawn.lock().unwrap().push(amount);
        Ok(TxConfirmation {
            tx_hash: H256::repeat_byte(0xcd),
            block_number: Some(19_000_002),
        })
    }
}

pub struct Harness {
    pub state: AppState,
    pub planner: Arc<PurchasePlanner>,
    pub sender: Arc<RecordingSender>,
    pub withdrawer: Arc<RecordingWithdrawer>,
}

/// State with no purchasing account and no admin signer. The route keys are
/// still configured.
pub fn read_only_state(chain: MockChain) -> AppState {
    let activity = Arc::new(Activity::new());
    AppState {
        chain: Arc::new(chain),
        cache: Arc::new(CacheService::in_memory()),
        policy: PlanPolicy::default(),
        expected_chain_id: 1,
        network: "Ethereum Mainnet".to_string(),
        planner: None,
        sender: None,
        admin: None,
        api_key: Some(PURCHASE_KEY.to_string()),
        admin_api_key: Some(ADMIN_KEY.to_string()),
        watcher: Arc::new(PurchaseWatcher::new(activity.clone())),
        activity,
    }
}

pub fn full_harness(chain: MockChain) -> Harness {
    let mut state = read_only_state(chain);
    let planner = Arc::new(PurchasePlanner::new(
        state.chain.clone(),
        state.policy,
        BUYER,
        Duration::from_secs(12),
        Duration::from_millis(500),
        state.activity.clone(),
    ));
    let sender = Arc::new(RecordingSender::default());
    let withdrawer = Arc::new(RecordingWithdrawer::default());

    state.planner = Some(planner.clone());
    state.sender = Some(sender.clone());
    state.admin = Some(withdrawer.clone());

    Harness {
        state,
        planner,
        sender,
        withdrawer,
    }
}
