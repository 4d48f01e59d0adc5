use crate::{
    error::PurchaseError,
    handlers::AppState,
    models::{ApiResponse, PlanSnapshot, PlanStatus},
    services::planner,
};
use axum::{
    extract::{Path, State},
    Json,
};
use ethers::types::Address;
use std::str::FromStr;

pub async fn current_plan(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlanStatus>>, PurchaseError> {
    let planner = state.planner.as_ref().ok_or_else(|| {
        PurchaseError::SignerUnavailable("no purchasing account configured".to_string())
    })?;
    let snapshot = planner.latest().ok_or(PurchaseError::NoBalance)?;
    let recent_success = state.watcher.recent_success(snapshot.account);

    Ok(Json(ApiResponse::new(
        PlanStatus {
            snapshot,
            recent_success,
        },
        "planner",
    )))
}

pub async fn quote_plan(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<PlanSnapshot>>, PurchaseError> {
    let account = Address::from_str(address.trim())
        .map_err(|e| PurchaseError::InvalidInput(format!("invalid address {}: {}", address, e)))?;

    let snapshot = planner::quote(state.chain.as_ref(), &state.policy, account).await?;
    state.activity.record_quote();

    Ok(Json(ApiResponse::new(snapshot, "ethereum-rpc")))
}
