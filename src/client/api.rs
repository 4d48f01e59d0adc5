use crate::{
    error::ErrorResponse,
    models::{
        ApiResponse, ContractBalance, PlanSnapshot, PlanStatus, PurchaseReceipt, TokenInfo,
        WithdrawRequest, WithdrawalReceipt,
    },
};
use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Thin client for the purchase service's HTTP API.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    admin_api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            admin_api_key: None,
        }
    }

    /// Bearer token sent with purchases.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Bearer token sent with withdrawals.
    pub fn with_admin_api_key(mut self, key: impl Into<String>) -> Self {
        self.admin_api_key = Some(key.into());
        self
    }

    fn authorized(request: RequestBuilder, key: Option<&str>) -> RequestBuilder {
        match key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn token(&self) -> Result<TokenInfo> {
        let response = self.client.get(self.url("/api/token")).send().await?;
        Self::decode(response).await
    }

    pub async fn plan(&self) -> Result<PlanStatus> {
        let response = self.client.get(self.url("/api/plan")).send().await?;
        Self::decode(response).await
    }

    pub async fn quote(&self, address: &str) -> Result<PlanSnapshot> {
        let response = self
            .client
            .get(self.url(&format!("/api/plan/{}", address)))
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn buy(&self) -> Result<PurchaseReceipt> {
        let request = self.client.post(self.url("/api/purchase"));
        let response = Self::authorized(request, self.api_key.as_deref())
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn contract_balance(&self) -> Result<ContractBalance> {
        let response = self.client.get(self.url("/admin/balance")).send().await?;
        Self::decode(response).await
    }

    pub async fn withdraw(&self, amount: &str) -> Result<WithdrawalReceipt> {
        let request = self.client.post(self.url("/admin/withdraw")).json(&WithdrawRequest {
            amount: amount.to_string(),
        });
        let response = Self::authorized(request, self.admin_api_key.as_deref())
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => match error.shortfall {
                    Some(shortfall) => bail!(
                        "{} ({}): additional {} ETH required",
                        error.error,
                        error.error_code,
                        shortfall
                    ),
                    None => bail!("{} ({})", error.error, error.error_code),
                },
                Err(_) => bail!("Request failed with {}: {}", status, body),
            }
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).context("Unexpected response body")?;
        Ok(envelope.data)
    }
}
