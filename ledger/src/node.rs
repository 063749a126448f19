//! REST client for a ledger node
//!
//! Every request carries a timeout. Transport failures and 5xx answers are
//! reported as [`LedgerError::Unavailable`] so callers can back off and
//! retry reads; a refused submission is [`LedgerError::Rejected`].

use async_trait::async_trait;
use dumbly_core::{
    Address, Amount, AssetId, Confirmation, LedgerError, LedgerGateway, LedgerResult,
    SignedGroup, TxId,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const TOKEN_HEADER: &str = "X-Node-API-Token";

#[derive(Clone)]
pub struct NodeClientConfig {
    /// Base URL, e.g. `http://127.0.0.1:4001`
    pub address: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

impl NodeClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for NodeClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClientConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AssetHoldingResponse {
    #[serde(rename = "asset-holding")]
    asset_holding: AssetHolding,
}

#[derive(Debug, Deserialize)]
struct AssetHolding {
    amount: Amount,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: TxId,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
}

#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    message: String,
}

pub struct NodeClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl NodeClient {
    pub fn new(config: NodeClientConfig) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: config.address.trim_end_matches('/').to_string(),
            token: config.token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> LedgerResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if response.status().is_server_error() {
            return Err(LedgerError::Unavailable(format!(
                "node answered {}",
                response.status()
            )));
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> LedgerResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::Malformed(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> LedgerResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        if !response.status().is_success() {
            return Err(LedgerError::Malformed(format!(
                "GET {} answered {}",
                path,
                response.status()
            )));
        }
        Self::decode(response).await
    }

    /// `None` when the account has not opted in
    async fn asset_holding(&self, address: &Address, asset_id: AssetId) -> LedgerResult<Option<Amount>> {
        let path = format!("/v2/accounts/{}/assets/{}", address, asset_id);
        let response = self.send(self.client.get(self.url(&path))).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let holding: AssetHoldingResponse = Self::decode(response).await?;
                Ok(Some(holding.asset_holding.amount))
            }
            status => Err(LedgerError::Malformed(format!(
                "GET {} answered {}",
                path, status
            ))),
        }
    }
}

#[async_trait]
impl LedgerGateway for NodeClient {
    async fn account_balance(&self, address: &Address, asset_id: AssetId) -> LedgerResult<Amount> {
        Ok(self.asset_holding(address, asset_id).await?.unwrap_or(0))
    }

    async fn is_opted_in(&self, address: &Address, asset_id: AssetId) -> LedgerResult<bool> {
        Ok(self.asset_holding(address, asset_id).await?.is_some())
    }

    async fn submit_group(&self, group: &SignedGroup) -> LedgerResult<TxId> {
        let request = self.client.post(self.url("/v2/transactions")).json(group);
        let response = self.send(request).await?;

        let status = response.status();
        if status.is_client_error() {
            let message = match response.json::<NodeErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.to_string(),
            };
            tracing::warn!(group = %group.group.id(), "node rejected group: {}", message);
            return Err(LedgerError::Rejected(message));
        }

        let submitted: SubmitResponse = Self::decode(response).await?;
        tracing::info!(group = %group.group.id(), tx_id = %submitted.tx_id, "group submitted");
        Ok(submitted.tx_id)
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u64,
    ) -> LedgerResult<Confirmation> {
        let status: StatusResponse = self.get_json("/v2/status").await?;
        let start = status.last_round;
        let mut current = start;

        loop {
            let pending: PendingResponse = self
                .get_json(&format!("/v2/transactions/pending/{}", tx_id))
                .await?;

            if let Some(round) = pending.confirmed_round.filter(|r| *r > 0) {
                return Ok(Confirmation::Confirmed { round });
            }
            if !pending.pool_error.is_empty() {
                return Err(LedgerError::Rejected(pending.pool_error));
            }
            if current >= start + max_rounds {
                return Ok(Confirmation::TimedOut {
                    rounds_waited: current - start,
                });
            }

            let _: serde_json::Value = self
                .get_json(&format!("/v2/status/wait-for-block-after/{}", current))
                .await?;
            current += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = NodeClient::new(NodeClientConfig::new("http://node:4001/")).unwrap();
        assert_eq!(client.url("/v2/status"), "http://node:4001/v2/status");
    }

    #[test]
    fn test_pending_defaults() {
        let pending: PendingResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(pending.confirmed_round, None);
        assert!(pending.pool_error.is_empty());
    }
}
