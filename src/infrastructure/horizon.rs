use crate::config::NetworkConfig;
use crate::domain::ports::{
    LedgerClient, LedgerClientBox, LedgerClientFactory, LedgerResponse, LedgerTransportError,
};
use crate::domain::transaction::TransactionEnvelope;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// `LedgerClient` backed by a Horizon server.
#[derive(Clone)]
pub struct HorizonClient {
    http: Client,
    horizon_url: String,
}

#[derive(Deserialize)]
struct HorizonAccount {
    sequence: String,
}

impl HorizonClient {
    pub fn new(horizon_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), horizon_url)
    }

    pub fn with_client(http: Client, horizon_url: impl Into<String>) -> Self {
        Self {
            http,
            horizon_url: horizon_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn horizon_url(&self) -> &str {
        &self.horizon_url
    }

    /// Factory choosing mainnet or testnet Horizon by network name.
    pub fn factory(network: NetworkConfig) -> LedgerClientFactory {
        let http = Client::new();
        Box::new(move |name: &str| {
            Box::new(HorizonClient::with_client(http.clone(), network.horizon_url(name)))
                as LedgerClientBox
        })
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn account_sequence(&self, address: &str) -> Result<i64> {
        let url = format!("{}/accounts/{}", self.horizon_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PaymentError::Ledger(format!("Horizon request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PaymentError::Ledger(format!(
                "Failed to load account {address}: HTTP {}",
                response.status().as_u16()
            )));
        }

        let account: HorizonAccount = response
            .json()
            .await
            .map_err(|e| PaymentError::Ledger(format!("Failed to parse Horizon response: {e}")))?;

        account
            .sequence
            .parse()
            .map_err(|e| PaymentError::Ledger(format!("Invalid sequence number: {e}")))
    }

    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> std::result::Result<LedgerResponse, LedgerTransportError> {
        let url = format!("{}/transactions", self.horizon_url);
        let response = self
            .http
            .post(&url)
            .form(&[("tx", envelope.signed_xdr.as_str())])
            .send()
            .await
            .map_err(|e| LedgerTransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerTransportError::new(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

        debug!(payment_id = %envelope.payment_id, status, "horizon submission response");
        Ok(LedgerResponse { status, body })
    }
}
