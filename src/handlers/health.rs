use crate::{handlers::AppState, models::HealthStatus};
use axum::{extract::State, Json};
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let redis_ok = state.cache.ping().await;
    let block_number = state.chain.block_number().await.ok();
    let ethereum_ok = block_number.is_some();

    let status = if redis_ok && ethereum_ok {
        "healthy"
    } else if ethereum_ok {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redis: redis_ok,
        ethereum_rpc: ethereum_ok,
        block_number,
        uptime_seconds: state.activity.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
