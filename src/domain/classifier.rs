//! Classification of raw ledger submission responses.
//!
//! Turns what the ledger said (or failed to say) into a [`SubmissionVerdict`]:
//! a txid, a reason to wait and resubmit, or a terminal [`PaymentError`].

use crate::domain::ports::{LedgerResponse, LedgerTransportError};
use crate::error::{
    PaymentError, SubmissionFailure, TX_TOO_EARLY, TX_TOO_LATE, UNEXPECTED_RESPONSE_CODE,
    UNKNOWN_ERROR_CODE,
};
use serde_json::Value;

/// Structured failure reason extracted from `extras.result_codes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCodes {
    pub transaction: String,
    pub operations: Option<Vec<String>>,
}

impl Default for ResultCodes {
    fn default() -> Self {
        Self {
            transaction: UNKNOWN_ERROR_CODE.to_string(),
            operations: None,
        }
    }
}

impl ResultCodes {
    fn into_error(self, kind: SubmissionFailure) -> PaymentError {
        PaymentError::TxSubmission {
            kind,
            tx_error_code: self.transaction,
            op_error_codes: self.operations,
        }
    }
}

/// What to do after one submission attempt.
#[derive(Debug)]
pub enum SubmissionVerdict {
    Succeeded(String),
    Retry(RetryReason),
    Failed(PaymentError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    TooEarly,
    ServerError(u16),
}

/// Extracts `(transaction, operations)` result codes from a response body.
///
/// Both fall back to `"unknown"` / `None` when the body lacks the structure.
pub fn classify(body: Option<&Value>) -> ResultCodes {
    let Some(codes) = body.and_then(|b| b.pointer("/extras/result_codes")) else {
        return ResultCodes::default();
    };

    let transaction = codes
        .get("transaction")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ERROR_CODE)
        .to_string();
    let operations = codes.get("operations").and_then(Value::as_array).map(|ops| {
        ops.iter()
            .map(|op| op.as_str().map_or_else(|| op.to_string(), str::to_string))
            .collect()
    });

    ResultCodes {
        transaction,
        operations,
    }
}

/// Reads the transaction id from a successful submission body.
pub fn txid(body: &Value) -> Option<String> {
    body.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Reads the `status` field a response body carries about itself.
///
/// Accepts both numeric and string encodings.
fn body_status(body: &Value) -> Option<u16> {
    match body.get("status")? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decides the next step for a response the ledger actually returned.
///
/// A 2xx without a txid is judged by the body's own `status` field rather
/// than the transport status. This mirrors an upstream SDK behaviour and is
/// preserved as-is.
pub fn assess_response(response: &LedgerResponse) -> SubmissionVerdict {
    let is_success_family = (200..300).contains(&response.status);
    if is_success_family && let Some(id) = txid(&response.body) {
        return SubmissionVerdict::Succeeded(id);
    }

    let effective = if is_success_family {
        body_status(&response.body)
    } else {
        Some(response.status)
    };

    match effective {
        Some(status @ 400..=499) => assess_client_error(status, classify(Some(&response.body))),
        Some(status @ 500..=599) => SubmissionVerdict::Retry(RetryReason::ServerError(status)),
        other => {
            let raw = other.unwrap_or(response.status);
            SubmissionVerdict::Failed(PaymentError::TxSubmission {
                kind: SubmissionFailure::UnexpectedResponse,
                tx_error_code: UNEXPECTED_RESPONSE_CODE.to_string(),
                op_error_codes: Some(vec![raw.to_string()]),
            })
        }
    }
}

/// Decides the next step after the request never produced a full response.
pub fn assess_transport(error: &LedgerTransportError) -> SubmissionVerdict {
    let codes = classify(error.body.as_ref());
    tracing::debug!(tx_error_code = %codes.transaction, "ledger transport failure");
    assess_codes(codes)
}

fn assess_client_error(status: u16, codes: ResultCodes) -> SubmissionVerdict {
    tracing::debug!(status, tx_error_code = %codes.transaction, "ledger rejected transaction");
    assess_codes(codes)
}

fn assess_codes(codes: ResultCodes) -> SubmissionVerdict {
    match codes.transaction.as_str() {
        TX_TOO_EARLY => SubmissionVerdict::Retry(RetryReason::TooEarly),
        TX_TOO_LATE => SubmissionVerdict::Failed(codes.into_error(SubmissionFailure::TimedOut)),
        _ => SubmissionVerdict::Failed(codes.into_error(SubmissionFailure::Rejected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> LedgerResponse {
        LedgerResponse { status, body }
    }

    fn failed_codes(verdict: SubmissionVerdict) -> (SubmissionFailure, String, Option<Vec<String>>) {
        match verdict {
            SubmissionVerdict::Failed(PaymentError::TxSubmission {
                kind,
                tx_error_code,
                op_error_codes,
            }) => (kind, tx_error_code, op_error_codes),
            other => panic!("expected a submission failure, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_extracts_result_codes() {
        let body = json!({
            "extras": {"result_codes": {"transaction": "tx_failed", "operations": ["op_no_source_account"]}}
        });
        let codes = classify(Some(&body));
        assert_eq!(codes.transaction, "tx_failed");
        assert_eq!(codes.operations, Some(vec!["op_no_source_account".to_string()]));
    }

    #[test]
    fn test_classify_defaults_without_structure() {
        assert_eq!(classify(None), ResultCodes::default());
        assert_eq!(classify(Some(&json!({"title": "Transaction Failed"}))).transaction, "unknown");
    }

    #[test]
    fn test_success_with_txid() {
        let verdict = assess_response(&response(200, json!({"id": "abc"})));
        assert!(matches!(verdict, SubmissionVerdict::Succeeded(id) if id == "abc"));
    }

    #[test]
    fn test_server_error_is_retried() {
        let verdict = assess_response(&response(503, json!({})));
        assert!(matches!(
            verdict,
            SubmissionVerdict::Retry(RetryReason::ServerError(503))
        ));
    }

    #[test]
    fn test_too_early_is_retried() {
        let body = json!({"extras": {"result_codes": {"transaction": "tx_too_early"}}});
        let verdict = assess_response(&response(400, body));
        assert!(matches!(verdict, SubmissionVerdict::Retry(RetryReason::TooEarly)));
    }

    #[test]
    fn test_too_late_is_a_timeout() {
        let body = json!({"extras": {"result_codes": {"transaction": "tx_too_late"}}});
        let (kind, code, ops) = failed_codes(assess_response(&response(400, body)));
        assert_eq!(kind, SubmissionFailure::TimedOut);
        assert_eq!(code, "tx_too_late");
        assert!(ops.is_none());
    }

    #[test]
    fn test_client_error_without_codes_is_unknown() {
        let (kind, code, ops) =
            failed_codes(assess_response(&response(400, json!({"title": "Transaction Failed"}))));
        assert_eq!(kind, SubmissionFailure::Rejected);
        assert_eq!(code, "unknown");
        assert!(ops.is_none());
    }

    #[test]
    fn test_success_status_without_txid_uses_body_status() {
        let retry = assess_response(&response(200, json!({"status": 504})));
        assert!(matches!(retry, SubmissionVerdict::Retry(RetryReason::ServerError(504))));

        let body = json!({
            "status": "400",
            "extras": {"result_codes": {"transaction": "tx_bad_seq"}}
        });
        let (kind, code, _) = failed_codes(assess_response(&response(200, body)));
        assert_eq!(kind, SubmissionFailure::Rejected);
        assert_eq!(code, "tx_bad_seq");
    }

    #[test]
    fn test_unexpected_status_records_raw_code() {
        let (kind, code, ops) = failed_codes(assess_response(&response(302, json!({}))));
        assert_eq!(kind, SubmissionFailure::UnexpectedResponse);
        assert_eq!(code, "unexpected_response_code");
        assert_eq!(ops, Some(vec!["302".to_string()]));

        let (_, _, ops) = failed_codes(assess_response(&response(200, json!({"status": 102}))));
        assert_eq!(ops, Some(vec!["102".to_string()]));
    }

    #[test]
    fn test_transport_failures() {
        let plain = LedgerTransportError::new("connection reset");
        let (kind, code, _) = failed_codes(assess_transport(&plain));
        assert_eq!(kind, SubmissionFailure::Rejected);
        assert_eq!(code, "unknown");

        let early = LedgerTransportError::with_body(
            "bad request",
            json!({"extras": {"result_codes": {"transaction": "tx_too_early"}}}),
        );
        assert!(matches!(
            assess_transport(&early),
            SubmissionVerdict::Retry(RetryReason::TooEarly)
        ));

        let late = LedgerTransportError::with_body(
            "bad request",
            json!({"extras": {"result_codes": {"transaction": "tx_too_late"}}}),
        );
        match assess_transport(&late) {
            SubmissionVerdict::Failed(err) => {
                assert!(err.is_timeout());
                assert!(matches!(
                    err,
                    PaymentError::TxSubmission { kind: SubmissionFailure::TimedOut, ref tx_error_code, .. }
                        if tx_error_code == "tx_too_late"
                ));
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
    }
}
