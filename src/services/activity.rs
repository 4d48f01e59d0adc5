use crate::models::Stats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Process-lifetime counters exposed on `/stats` and the dashboard.
pub struct Activity {
    plans_computed: AtomicU64,
    quotes_served: AtomicU64,
    purchases_submitted: AtomicU64,
    purchase_events: AtomicU64,
    withdrawals_submitted: AtomicU64,
    start_time: Instant,
}

impl Activity {
    pub fn new() -> Self {
        Self {
            plans_computed: AtomicU64::new(0),
            quotes_served: AtomicU64::new(0),
            purchases_submitted: AtomicU64::new(0),
            purchase_events: AtomicU64::new(0),
            withdrawals_submitted: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_plan(&self) {
        self.plans_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_quote(&self) {
        self.quotes_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_purchase(&self) {
        self.purchases_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_purchase_event(&self) {
        self.purchase_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_withdrawal(&self) {
        self.withdrawals_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> Stats {
        Stats {
            plans_computed: self.plans_computed.load(Ordering::Relaxed),
            quotes_served: self.quotes_served.load(Ordering::Relaxed),
            purchases_submitted: self.purchases_submitted.load(Ordering::Relaxed),
            purchase_events: self.purchase_events.load(Ordering::Relaxed),
            withdrawals_submitted: self.withdrawals_submitted.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}
