pub mod activity;
pub mod admin;
pub mod cache;
pub mod calculator;
pub mod chain;
pub mod debounce;
pub mod ethereum;
pub mod events;
pub mod planner;
pub mod submitter;

pub use activity::Activity;
pub use admin::{AdminService, TxConfirmation, Withdrawer};
pub use cache::CacheService;
pub use calculator::PlanPolicy;
pub use chain::ChainState;
pub use debounce::Debouncer;
pub use ethereum::EthereumService;
pub use events::PurchaseWatcher;
pub use planner::PurchasePlanner;
pub use submitter::{PurchaseOrder, PurchaseSender, PurchaseSubmitter};
