//! HTTP client for the swap service API.

use crate::amount::SwapQuote;
use crate::error::{Error, Result};
use crate::types::Direction;

use super::types::*;
use super::{ServiceFuture, SwapService};

/// Swap service API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the swap service API (e.g., "https://api.boltz.exchange/v2")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the BTC/BTC fee schedule for `direction`.
    pub async fn get_fee_schedule(&self, direction: Direction) -> Result<PairInfo> {
        let url = format!("{}/swap/{}", self.base_url, direction.as_path());
        let mut pairs: PairMap = self.get_json(&url).await?;

        pairs
            .remove(BTC)
            .and_then(|mut targets| targets.remove(BTC))
            .ok_or_else(|| Error::Service(format!("No BTC/BTC pair for {direction} swaps")))
    }

    /// Get the fee schedule for `direction` as a quote.
    pub async fn get_quote(&self, direction: Direction) -> Result<SwapQuote> {
        self.get_fee_schedule(direction).await?.to_quote(direction)
    }

    /// Create a submarine swap paying `invoice`.
    ///
    /// # Arguments
    /// * `invoice` - BOLT11 invoice the service pays once the lockup is funded
    /// * `refund_public_key` - Hex-encoded public key of this swap's ephemeral keypair
    pub async fn create_submarine_swap(
        &self,
        invoice: &str,
        refund_public_key: &str,
    ) -> Result<CreateSubmarineResponse> {
        let url = format!("{}/swap/submarine", self.base_url);
        let request = CreateSubmarineRequest {
            from: BTC.to_string(),
            to: BTC.to_string(),
            invoice: invoice.to_string(),
            refund_public_key: refund_public_key.to_string(),
        };
        self.post_json(&url, &request).await
    }

    /// Get the details needed to co-sign the service's claim of a submarine swap.
    pub async fn get_claim_details(&self, swap_id: &str) -> Result<ClaimDetailsResponse> {
        let url = format!("{}/swap/submarine/{}/claim", self.base_url, swap_id);
        self.get_json(&url).await
    }

    /// Send our public nonce and partial signature for the claim.
    pub async fn submit_claim(&self, swap_id: &str, request: &SubmitClaimRequest) -> Result<()> {
        let url = format!("{}/swap/submarine/{}/claim", self.base_url, swap_id);
        let _ack: serde_json::Value = self.post_json(&url, request).await?;
        Ok(())
    }

    // Helper methods

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to send request to {}: {}", url, e)))?;

        Self::read_json("GET", url, response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned, R: serde::Serialize>(
        &self,
        url: &str,
        body: &R,
    ) -> Result<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Failed to send request to {}: {}", url, e)))?;

        Self::read_json("POST", url, response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        method: &str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let error: ApiError = response.json().await.unwrap_or_else(|_| ApiError {
                error: format!("Unknown error ({status})"),
            });
            return Err(Error::Service(error.error));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read response: {}", e)))?;

        log::debug!("{} {} response: {}", method, url, text);

        serde_json::from_str(&text)
            .map_err(|e| Error::Parse(format!("Failed to parse response: {}. Body: {}", e, text)))
    }
}

impl SwapService for ApiClient {
    fn claim_details(&self, swap_id: &str) -> ServiceFuture<'_, ClaimDetailsResponse> {
        let swap_id = swap_id.to_string();
        Box::pin(async move { self.get_claim_details(&swap_id).await })
    }

    fn submit_claim(&self, swap_id: &str, request: &SubmitClaimRequest) -> ServiceFuture<'_, ()> {
        let swap_id = swap_id.to_string();
        let request = request.clone();
        Box::pin(async move { ApiClient::submit_claim(self, &swap_id, &request).await })
    }
}
