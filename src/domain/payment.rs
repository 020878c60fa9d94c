use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a positive payment amount in Pi.
///
/// Wraps `rust_decimal::Decimal` so that a zero or negative amount can never
/// reach the transaction builder.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::invalid("amount", "Amount must be positive"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Request body for creating an app-to-user payment on the platform.
///
/// Every field is optional at the type level so that a missing one is
/// reported as a validation error naming it, rather than as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl PaymentData {
    pub fn new(amount: Decimal, memo: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            memo: Some(memo.into()),
            metadata: None,
            uid: Some(uid.into()),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Checks that amount, memo, metadata and uid are all present.
    pub fn validate(&self) -> Result<()> {
        let amount = self.amount.ok_or_else(|| PaymentError::missing("amount"))?;
        Amount::new(amount)?;
        if is_blank(self.memo.as_deref()) {
            return Err(PaymentError::missing("memo"));
        }
        if !self.metadata.as_ref().is_some_and(is_present_json) {
            return Err(PaymentError::missing("metadata"));
        }
        if is_blank(self.uid.as_deref()) {
            return Err(PaymentError::missing("uid"));
        }
        Ok(())
    }
}

/// The ledger transaction linked to a payment once it has been submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, rename = "_link")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default)]
    pub developer_approved: bool,
    #[serde(default)]
    pub transaction_verified: bool,
    #[serde(default)]
    pub developer_completed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub user_cancelled: bool,
}

/// A payment record as returned by the platform API.
///
/// The platform is the system of record; this is the last-known copy held
/// while the payment is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub identifier: String,
    #[serde(default)]
    pub network: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<PaymentTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Payment {
    /// The txid already linked to this payment, if any.
    pub fn linked_txid(&self) -> Option<&str> {
        self.transaction
            .as_ref()
            .and_then(|tx| tx.txid.as_deref())
            .filter(|txid| !txid.trim().is_empty())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn is_present_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
