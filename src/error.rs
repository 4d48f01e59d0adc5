use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No balance observed for the purchasing account yet")]
    NoBalance,

    #[error("Insufficient funds for purchase: {shortfall} ETH more required")]
    NotEligible { shortfall: String },

    #[error("Wrong network: expected chain {expected}, connected to {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Signer not configured: {0}")]
    SignerUnavailable(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("RPC error: {0}")]
    RpcError(#[from] ethers::providers::ProviderError),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl PurchaseError {
    pub fn contract<E: std::fmt::Display>(err: E) -> Self {
        Self::ContractError(err.to_string())
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NoBalance => "NO_BALANCE",
            Self::NotEligible { .. } => "INSUFFICIENT_FUNDS",
            Self::WrongNetwork { .. } => "WRONG_NETWORK",
            Self::SignerUnavailable(_) => "SIGNER_UNAVAILABLE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::TransactionFailed(_) => "TRANSACTION_FAILED",
            Self::RpcError(_) | Self::ContractError(_) => "UPSTREAM_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NoBalance => StatusCode::CONFLICT,
            Self::NotEligible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::WrongNetwork { .. } => StatusCode::PRECONDITION_FAILED,
            Self::SignerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TransactionFailed(_) | Self::RpcError(_) | Self::ContractError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,

    /// Extra ETH the account needs before it can buy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<String>,
}

impl IntoResponse for PurchaseError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.error_code();
        let shortfall = match &self {
            PurchaseError::NotEligible { shortfall } => Some(shortfall.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
            shortfall,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code, "Request failed");
        } else {
            tracing::warn!(error = %self, error_code, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
