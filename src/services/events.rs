use crate::{
    contracts::{TokensPurchasedFilter, UnityToken},
    models::PurchaseEvent,
    services::Activity,
};
use anyhow::Result;
use chrono::Utc;
use ethers::{
    contract::LogMeta,
    providers::{Provider, Ws},
    types::Address,
};
use futures::StreamExt;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// How long a completed purchase is reported as a fresh success.
pub const SUCCESS_WINDOW: Duration = Duration::from_secs(5);

/// Fans out `TokensPurchased` events to dashboard subscribers.
pub struct PurchaseWatcher {
    events: broadcast::Sender<PurchaseEvent>,
    last_seen: RwLock<Option<(Address, Instant)>>,
    activity: Arc<Activity>,
}

impl PurchaseWatcher {
    pub fn new(activity: Arc<Activity>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            events,
            last_seen: RwLock::new(None),
            activity,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PurchaseEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: PurchaseEvent) {
        tracing::info!(
            buyer = ?event.buyer,
            eth_amount = %event.eth_amount,
            token_amount = %event.token_amount,
            "Tokens purchased"
        );

        if let Ok(mut last_seen) = self.last_seen.write() {
            *last_seen = Some((event.buyer, Instant::now()));
        }
        self.activity.record_purchase_event();

        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Whether `account` completed a purchase within the last
    /// [`SUCCESS_WINDOW`].
    pub fn recent_success(&self, account: Address) -> bool {
        match self.last_seen.read() {
            Ok(last_seen) => matches!(
                *last_seen,
                Some((buyer, at)) if buyer == account && at.elapsed() < SUCCESS_WINDOW
            ),
            Err(_) => false,
        }
    }

    pub async fn run(self: Arc<Self>, ws_url: String, token_address: Address) -> Result<()> {
        let ws = Ws::connect(ws_url).await?;
        let provider = Arc::new(Provider::new(ws));
        let token = UnityToken::new(token_address, provider);

        tracing::info!("Watching TokensPurchased events on {:?}", token_address);

        let filter = token.tokens_purchased_filter();
        let mut stream = filter.subscribe_with_meta().await?;

        while let Some(item) = stream.next().await {
            match item {
                Ok((log, meta)) => self.publish(Self::to_event(log, meta)),
                Err(e) => tracing::warn!("Undecodable purchase event: {}", e),
            }
        }

        tracing::warn!("Purchase event subscription ended");
        Ok(())
    }

    fn to_event(log: TokensPurchasedFilter, meta: LogMeta) -> PurchaseEvent {
        PurchaseEvent {
            buyer: log.buyer,
            eth_amount: log.eth_amount,
            token_amount: log.token_amount,
            tx_hash: Some(meta.transaction_hash),
            block_number: Some(meta.block_number.as_u64()),
            observed_at: Utc::now(),
        }
    }
}
