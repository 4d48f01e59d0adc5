use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub data_source: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, data_source: &str) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            data_source: data_source.to_string(),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub redis: bool,
    pub ethereum_rpc: bool,
    pub block_number: Option<u64>,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub plans_computed: u64,
    pub quotes_served: u64,
    pub purchases_submitted: u64,
    pub purchase_events: u64,
    pub withdrawals_submitted: u64,
    pub uptime_seconds: u64,
}
