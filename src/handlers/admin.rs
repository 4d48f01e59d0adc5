use crate::{
    error::PurchaseError,
    handlers::AppState,
    models::{
        units::format_token_amount, ApiResponse, ContractBalance, WithdrawRequest,
        WithdrawalReceipt,
    },
    services::admin::parse_withdraw_amount,
};
use axum::{extract::State, Json};

pub async fn contract_balance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ContractBalance>>, PurchaseError> {
    let metadata = state.chain.token_metadata().await?;
    let balance = state.chain.contract_token_balance().await?;

    Ok(Json(ApiResponse::new(
        ContractBalance {
            token: metadata.address,
            balance: format_token_amount(balance, metadata.decimals)?,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
        },
        "token-contract",
    )))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<ApiResponse<WithdrawalReceipt>>, PurchaseError> {
    let admin = state
        .admin
        .as_ref()
        .ok_or_else(|| PurchaseError::SignerUnavailable("ADMIN_PRIVATE_KEY not set".to_string()))?;

    let metadata = state.chain.token_metadata().await?;
    let amount = parse_withdraw_amount(&request.amount, metadata.decimals)?;
    let confirmation = admin.withdraw(amount).await?;
    state.activity.record_withdrawal();

    Ok(Json(ApiResponse::new(
        WithdrawalReceipt {
            tx_hash: confirmation.tx_hash,
            amount: format_token_amount(amount, metadata.decimals)?,
            decimals: metadata.decimals,
            block_number: confirmation.block_number,
        },
        "token-contract",
    )))
}
