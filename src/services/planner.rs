use crate::{
    error::PurchaseError,
    models::{BalanceObservation, GasEstimate, PlanSnapshot},
    services::{Activity, ChainState, Debouncer, PlanPolicy},
};
use chrono::Utc;
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

type EstimateResult = (U256, Result<Option<GasEstimate>, PurchaseError>);

/// Keeps an up-to-date [`PlanSnapshot`] for one account.
///
/// The balance is polled; every new plan's `max_spend` goes through a
/// debouncer and each released value triggers one gas estimate for a
/// purchase of that size. Estimates run alongside polling; one that arrives
/// for an amount no longer planned is dropped, otherwise it replaces the
/// previous estimate and the plan is recomputed.
pub struct PurchasePlanner {
    chain: Arc<dyn ChainState>,
    policy: PlanPolicy,
    account: Address,
    poll_interval: Duration,
    debounce_window: Duration,
    activity: Arc<Activity>,
    snapshots: watch::Sender<Option<PlanSnapshot>>,
}

impl PurchasePlanner {
    pub fn new(
        chain: Arc<dyn ChainState>,
        policy: PlanPolicy,
        account: Address,
        poll_interval: Duration,
        debounce_window: Duration,
        activity: Arc<Activity>,
    ) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            chain,
            policy,
            account,
            poll_interval,
            debounce_window,
            activity,
            snapshots,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// `None` until a balance has been observed.
    pub fn latest(&self) -> Option<PlanSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PlanSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Computes and publishes a plan. On invalid input the previous snapshot
    /// stays in place.
    pub fn apply(&self, balance: U256, estimate: Option<GasEstimate>) -> Option<PlanSnapshot> {
        match snapshot_for(&self.policy, self.account, balance, estimate) {
            Ok(snapshot) => {
                tracing::info!(
                    account = ?self.account,
                    balance = %snapshot.balance,
                    gas_cost = %snapshot.gas_cost,
                    max_spend = %snapshot.plan.max_spend,
                    eligible = snapshot.plan.eligible,
                    shortfall = %snapshot.plan.shortfall,
                    "Purchase plan updated"
                );
                self.activity.record_plan();
                self.snapshots.send_replace(Some(snapshot.clone()));
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!("Keeping previous plan for {:?}: {}", self.account, e);
                None
            }
        }
    }

    /// Applies a new plan and queues its `max_spend` for estimation,
    /// remembering it as the amount estimates must match.
    fn replan(
        &self,
        balance: U256,
        estimate: Option<GasEstimate>,
        debouncer: &Debouncer<U256>,
        requested: &mut Option<U256>,
    ) {
        if let Some(snapshot) = self.apply(balance, estimate) {
            *requested = Some(snapshot.plan.max_spend);
            debouncer.push(snapshot.plan.max_spend);
        }
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            "Planning purchases for {:?} (poll every {:?}, debounce {:?})",
            self.account,
            self.poll_interval,
            self.debounce_window
        );

        let debouncer = Debouncer::new(self.debounce_window);
        let mut released = debouncer.subscribe();
        let (estimates_tx, mut estimates) = mpsc::unbounded_channel::<EstimateResult>();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut balance: Option<U256> = None;
        let mut estimate: Option<GasEstimate> = None;
        let mut requested: Option<U256> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let observed = match self.chain.native_balance(self.account).await {
                        Ok(observed) => observed,
                        Err(e) => {
                            tracing::warn!("Balance query for {:?} failed: {}", self.account, e);
                            continue;
                        }
                    };
                    if balance == Some(observed) {
                        continue;
                    }
                    balance = Some(observed);
                    self.replan(observed, estimate, &debouncer, &mut requested);
                }

                changed = released.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some(value) = *released.borrow_and_update() else {
                        continue;
                    };
                    if value.is_zero() {
                        continue;
                    }

                    let chain = self.chain.clone();
                    let account = self.account;
                    let estimates_tx = estimates_tx.clone();
                    tokio::spawn(async move {
                        let result = chain.estimate_purchase_gas(account, value).await;
                        // The planner may have stopped.
                        let _ = estimates_tx.send((value, result));
                    });
                }

                Some((value, result)) = estimates.recv() => {
                    let fresh = match result {
                        Ok(fresh) => fresh,
                        Err(e) => {
                            tracing::warn!("Gas estimate request failed: {}", e);
                            continue;
                        }
                    };

                    if requested != Some(value) {
                        tracing::debug!("Dropping gas estimate for superseded amount {}", value);
                        continue;
                    }
                    if fresh == estimate {
                        continue;
                    }
                    estimate = fresh;

                    if let Some(observed) = balance {
                        self.replan(observed, estimate, &debouncer, &mut requested);
                    }
                }
            }
        }
    }
}

fn snapshot_for(
    policy: &PlanPolicy,
    account: Address,
    balance: U256,
    estimate: Option<GasEstimate>,
) -> Result<PlanSnapshot, PurchaseError> {
    let gas_cost = policy.gas_cost(estimate.as_ref())?;
    let plan = policy.compute(&BalanceObservation::from_wei(balance), estimate.as_ref())?;
    Ok(PlanSnapshot {
        account,
        plan,
        balance,
        gas_cost,
        estimate,
        computed_at: Utc::now(),
    })
}

/// One-off plan for any account: a first pass with the fallback reserve
/// sizes the purchase, then the real estimate for that size is applied.
pub async fn quote(
    chain: &dyn ChainState,
    policy: &PlanPolicy,
    account: Address,
) -> Result<PlanSnapshot, PurchaseError> {
    let balance = chain.native_balance(account).await?;
    let first = snapshot_for(policy, account, balance, None)?;
    if first.plan.max_spend.is_zero() {
        return Ok(first);
    }

    let estimate = match chain.estimate_purchase_gas(account, first.plan.max_spend).await {
        Ok(estimate) => estimate,
        Err(e) => {
            tracing::warn!(
                "Gas estimate for {:?} failed, using fallback reserve: {}",
                account,
                e
            );
            None
        }
    };
    snapshot_for(policy, account, balance, estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{units::parse_native, TokenMetadata};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct MockChain {
        balance: Mutex<U256>,
        estimate: Option<GasEstimate>,
        estimate_fails: bool,
        /// The first estimate waits on the gate and then answers with the
        /// stale value.
        stalled: Option<(Notify, GasEstimate)>,
        estimate_calls: AtomicUsize,
    }

    impl MockChain {
        fn new(balance: &str, estimate: Option<GasEstimate>) -> Self {
            Self {
                balance: Mutex::new(parse_native(balance).unwrap()),
                estimate,
                estimate_fails: false,
                stalled: None,
                estimate_calls: AtomicUsize::new(0),
            }
        }

        fn set_balance(&self, balance: &str) {
            *self.balance.lock().unwrap() = parse_native(balance).unwrap();
        }
    }

    #[async_trait]
    impl ChainState for MockChain {
        async fn chain_id(&self) -> Result<u64, PurchaseError> {
            Ok(1)
        }

        async fn block_number(&self) -> Result<u64, PurchaseError> {
            Ok(1)
        }

        async fn native_balance(&self, _account: Address) -> Result<U256, PurchaseError> {
            Ok(*self.balance.lock().unwrap())
        }

        async fn estimate_purchase_gas(
            &self,
            _from: Address,
            _value: U256,
        ) -> Result<Option<GasEstimate>, PurchaseError> {
            let call = self.estimate_calls.fetch_add(1, Ordering::SeqCst);
            if self.estimate_fails {
                return Err(PurchaseError::ContractError("gas price unavailable".to_string()));
            }
            if let (0, Some((gate, stale))) = (call, &self.stalled) {
                gate.notified().await;
                return Ok(Some(*stale));
            }
            Ok(self.estimate)
        }

        async fn token_metadata(&self) -> Result<TokenMetadata, PurchaseError> {
            Ok(TokenMetadata::fallback(Address::zero()))
        }

        async fn contract_token_balance(&self) -> Result<U256, PurchaseError> {
            Ok(U256::zero())
        }
    }

    fn gwei_estimate() -> GasEstimate {
        GasEstimate::new(U256::from(21_000u64), U256::from(1_000_000_000u64))
    }

    fn planner(chain: Arc<MockChain>) -> Arc<PurchasePlanner> {
        Arc::new(PurchasePlanner::new(
            chain,
            PlanPolicy::default(),
            Address::repeat_byte(0x11),
            Duration::from_secs(12),
            Duration::from_millis(500),
            Arc::new(Activity::new()),
        ))
    }

    #[test]
    fn no_snapshot_before_first_balance() {
        let planner = planner(Arc::new(MockChain::new("1", None)));
        assert!(planner.latest().is_none());
    }

    #[test]
    fn apply_keeps_plan_and_inputs_together() {
        let planner = planner(Arc::new(MockChain::new("1", None)));
        let snapshot = planner.apply(parse_native("0.03").unwrap(), None).unwrap();

        assert_eq!(snapshot.gas_cost, parse_native("0.01").unwrap());
        assert!(!snapshot.plan.eligible);
        assert_eq!(snapshot.plan.shortfall, parse_native("0.03").unwrap());
        assert_eq!(planner.latest(), Some(snapshot));
    }

    #[tokio::test(start_paused = true)]
    async fn refines_plan_once_debounced_estimate_arrives() {
        let chain = Arc::new(MockChain::new("1", Some(gwei_estimate())));
        let planner = planner(chain.clone());
        let mut snapshots = planner.subscribe();
        let task = tokio::spawn(planner.clone().run());

        snapshots.changed().await.unwrap();
        let first = snapshots.borrow_and_update().clone().unwrap();
        assert!(first.estimate.is_none());
        assert_eq!(first.plan.max_spend, parse_native("0.99").unwrap());

        snapshots.changed().await.unwrap();
        let refined = snapshots.borrow_and_update().clone().unwrap();
        assert_eq!(refined.estimate, Some(gwei_estimate()));
        assert_eq!(
            refined.plan.max_spend,
            parse_native("1").unwrap() - U256::from(23_100_000_000_000u64)
        );
        assert!(refined.plan.eligible);

        // The refined amount is estimated once more; the identical answer
        // does not produce another plan.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 2);
        assert!(!snapshots.has_changed().unwrap());

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn missing_estimate_keeps_fallback_plan() {
        let chain = Arc::new(MockChain::new("0.5", None));
        let planner = planner(chain.clone());
        let task = tokio::spawn(planner.clone().run());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let snapshot = planner.latest().unwrap();
        assert!(snapshot.estimate.is_none());
        assert_eq!(snapshot.plan.max_spend, parse_native("0.49").unwrap());
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 1);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn late_estimate_for_superseded_amount_is_dropped() {
        let stale = GasEstimate::new(U256::from(100_000u64), U256::from(100_000_000_000u64));
        let chain = Arc::new(MockChain {
            stalled: Some((Notify::new(), stale)),
            ..MockChain::new("1", Some(gwei_estimate()))
        });
        let planner = planner(chain.clone());
        let task = tokio::spawn(planner.clone().run());

        // 0.99 is released after the debounce window and its estimate stalls.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 1);

        // The next poll sees a new balance while that estimate is in flight.
        chain.set_balance("2");
        tokio::time::sleep(Duration::from_millis(11_200)).await;
        let replanned = planner.latest().unwrap();
        assert_eq!(replanned.balance, parse_native("2").unwrap());
        assert_eq!(replanned.plan.max_spend, parse_native("1.99").unwrap());

        let (gate, _) = chain.stalled.as_ref().unwrap();
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_late_estimate = planner.latest().unwrap();
        assert!(after_late_estimate.estimate.is_none());
        assert_eq!(after_late_estimate, replanned);

        // The estimate for 1.99 is applied once it is released.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let refined = planner.latest().unwrap();
        assert_eq!(refined.estimate, Some(gwei_estimate()));
        assert_eq!(
            refined.plan.max_spend,
            parse_native("2").unwrap() - U256::from(23_100_000_000_000u64)
        );

        task.abort();
    }

    #[tokio::test]
    async fn quote_falls_back_when_estimate_fails() {
        let chain = MockChain {
            estimate_fails: true,
            ..MockChain::new("1", Some(gwei_estimate()))
        };
        let snapshot = quote(&chain, &PlanPolicy::default(), Address::repeat_byte(0x22))
            .await
            .unwrap();

        assert!(snapshot.estimate.is_none());
        assert_eq!(snapshot.gas_cost, parse_native("0.01").unwrap());
        assert_eq!(snapshot.plan.max_spend, parse_native("0.99").unwrap());
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quote_applies_estimate_for_sized_purchase() {
        let chain = MockChain::new("2", Some(gwei_estimate()));
        let snapshot = quote(&chain, &PlanPolicy::default(), Address::repeat_byte(0x22))
            .await
            .unwrap();

        assert_eq!(snapshot.gas_cost, U256::from(23_100_000_000_000u64));
        assert!(snapshot.plan.eligible);
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quote_skips_estimate_for_empty_account() {
        let chain = MockChain::new("0", Some(gwei_estimate()));
        let snapshot = quote(&chain, &PlanPolicy::default(), Address::repeat_byte(0x22))
            .await
            .unwrap();

        assert_eq!(snapshot.plan.shortfall, parse_native("0.06").unwrap());
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 0);
    }
}
