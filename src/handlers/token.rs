use crate::{
    error::PurchaseError,
    handlers::AppState,
    models::{ApiResponse, TokenInfo},
};
use axum::{extract::State, Json};

/// Tokens are sold 1:1 against ETH.
pub const TOKEN_PRICE: &str = "1 ETH = 1 UNT";

pub async fn token_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TokenInfo>>, PurchaseError> {
    let metadata = state.chain.token_metadata().await?;

    Ok(Json(ApiResponse::new(
        TokenInfo {
            metadata,
            price: TOKEN_PRICE.to_string(),
            network: state.network.clone(),
            chain_id: state.expected_chain_id,
        },
        "token-contract",
    )))
}
