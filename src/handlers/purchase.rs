use crate::{
    error::PurchaseError,
    handlers::AppState,
    models::{ApiResponse, PurchaseReceipt},
    services::submitter::authorize_purchase,
};
use axum::{extract::State, Json};

/// Buys the maximum affordable amount for the configured account.
pub async fn buy_tokens(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PurchaseReceipt>>, PurchaseError> {
    let (Some(planner), Some(sender)) = (state.planner.as_ref(), state.sender.as_ref()) else {
        return Err(PurchaseError::SignerUnavailable(
            "PURCHASER_PRIVATE_KEY not set".to_string(),
        ));
    };

    let chain_id = state.chain.chain_id().await?;
    let order = authorize_purchase(
        planner.latest().as_ref(),
        chain_id,
        state.expected_chain_id,
    )?;

    let receipt = sender.send_purchase(&order).await?;
    state.activity.record_purchase();

    Ok(Json(ApiResponse::new(receipt, "ethereum-rpc")))
}
