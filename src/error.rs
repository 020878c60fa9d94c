use std::fmt;
use thiserror::Error;

/// Error code reported when the ledger gives no structured reason.
pub const UNKNOWN_ERROR_CODE: &str = "unknown";
/// Synthetic code for ledger responses outside the 2xx/4xx/5xx families.
pub const UNEXPECTED_RESPONSE_CODE: &str = "unexpected_response_code";
/// Ledger code for a transaction submitted before its `min_time`.
pub const TX_TOO_EARLY: &str = "tx_too_early";
/// Ledger code for a transaction submitted after its `max_time`.
pub const TX_TOO_LATE: &str = "tx_too_late";

/// Why a ledger submission cycle ended without a txid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// The ledger rejected the transaction content.
    Rejected,
    /// The validity window closed before the ledger accepted the transaction.
    TimedOut,
    /// The ledger answered with a status code outside the known families.
    UnexpectedResponse,
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Rejected => "rejected",
            Self::TimedOut => "timed out",
            Self::UnexpectedResponse => "unexpected response",
        };
        f.write_str(label)
    }
}

/// Every failure a payment workflow can surface to its caller.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation failed for `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("API request failed with status {status}: {message}")]
    ApiRequest {
        message: String,
        status: u16,
        body: String,
    },
    #[error("Payment not found: {payment_id}")]
    PaymentNotFound { payment_id: String },
    #[error("Payment {payment_id} already has a linked txid: {txid}")]
    TxidAlreadyLinked { payment_id: String, txid: String },
    #[error("Transaction submission {kind}: {tx_error_code}")]
    TxSubmission {
        kind: SubmissionFailure,
        tx_error_code: String,
        op_error_codes: Option<Vec<String>>,
    },
    #[error("Wallet mismatch: payment is sent from {expected} but the wallet is {actual}")]
    WalletMismatch { expected: String, actual: String },
    #[error("Invalid private seed: {0}")]
    InvalidSeed(String),
    #[error("Ledger error: {0}")]
    Ledger(String),
    #[error("Transaction encoding error: {0}")]
    Encoding(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PaymentError {
    pub(crate) fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: format!("Missing {field}"),
        }
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Terminal error for a submission cycle that outlived its validity window.
    pub fn submission_timed_out() -> Self {
        Self::TxSubmission {
            kind: SubmissionFailure::TimedOut,
            tx_error_code: TX_TOO_LATE.to_string(),
            op_error_codes: None,
        }
    }

    /// Returns true if this is a submission that ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::TxSubmission {
                kind: SubmissionFailure::TimedOut,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
