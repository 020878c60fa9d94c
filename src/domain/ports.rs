use super::payment::{Payment, PaymentData};
use super::transaction::TransactionEnvelope;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Storage for payments that are open on this process.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn put(&self, payment_id: &str, payment: Payment) -> Result<()>;
    async fn get(&self, payment_id: &str) -> Result<Option<Payment>>;
    async fn remove(&self, payment_id: &str) -> Result<()>;
    async fn ids(&self) -> Result<Vec<String>>;
}

/// The payment platform's REST API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn create_payment(&self, data: &PaymentData) -> Result<Payment>;
    async fn get_payment(&self, payment_id: &str) -> Result<Payment>;
    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<Payment>;
    async fn cancel_payment(&self, payment_id: &str) -> Result<Payment>;
    async fn incomplete_server_payments(&self) -> Result<Vec<Payment>>;
}

/// A response the ledger returned for a submission, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// A submission that failed below the HTTP layer.
///
/// `body` carries whatever partial response was available, usually none.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTransportError {
    pub message: String,
    pub body: Option<serde_json::Value>,
}

impl LedgerTransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(message: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            body: Some(body),
        }
    }
}

impl fmt::Display for LedgerTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LedgerTransportError {}

/// Client for one ledger environment (a Horizon server).
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current sequence number of `address`.
    async fn account_sequence(&self, address: &str) -> Result<i64>;

    async fn submit_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> std::result::Result<LedgerResponse, LedgerTransportError>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type PlatformApiBox = Box<dyn PlatformApi>;
pub type LedgerClientBox = Box<dyn LedgerClient>;

/// Resolves the ledger client for a payment's network name.
pub type LedgerClientFactory = Box<dyn Fn(&str) -> LedgerClientBox + Send + Sync>;
