pub mod admin;
pub mod dashboard;
pub mod health;
pub mod plan;
pub mod purchase;
pub mod stats;
pub mod token;

pub use admin::*;
pub use dashboard::*;
pub use health::*;
pub use plan::*;
pub use purchase::*;
pub use stats::*;
pub use token::*;

use crate::services::{
    Activity, CacheService, ChainState, PlanPolicy, PurchasePlanner, PurchaseSender,
    PurchaseWatcher, Withdrawer,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<dyn ChainState>,
    pub cache: Arc<CacheService>,
    pub policy: PlanPolicy,
    pub expected_chain_id: u64,
    pub network: String,
    /// Present when a purchasing account is configured.
    pub planner: Option<Arc<PurchasePlanner>>,
    pub sender: Option<Arc<dyn PurchaseSender>>,
    pub admin: Option<Arc<dyn Withdrawer>>,
    /// Bearer token for `POST /api/purchase`.
    pub api_key: Option<String>,
    /// Bearer token for `POST /admin/withdraw`.
    pub admin_api_key: Option<String>,
    pub watcher: Arc<PurchaseWatcher>,
    pub activity: Arc<Activity>,
}
