use crate::config::{SubmissionConfig, TimeFn};
use crate::domain::classifier::{self, SubmissionVerdict};
use crate::domain::ports::LedgerClient;
use crate::domain::transaction::TransactionEnvelope;
use crate::error::{PaymentError, Result};
use tracing::{info, warn};

/// Drives one signed envelope to a terminal outcome on the ledger.
///
/// Server errors and `tx_too_early` are retried with the same envelope after
/// a fixed delay. There is no attempt limit: the loop ends when the ledger
/// accepts or rejects the transaction, or when the envelope's `max_time` has
/// passed.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    config: SubmissionConfig,
    time_fn: TimeFn,
}

impl SubmissionCoordinator {
    pub fn new(config: SubmissionConfig, time_fn: TimeFn) -> Self {
        Self { config, time_fn }
    }

    /// Submits `envelope` until it succeeds, fails, or times out.
    ///
    /// Returns the txid on success.
    pub async fn submit(
        &self,
        ledger: &dyn LedgerClient,
        envelope: &TransactionEnvelope,
    ) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let verdict = match ledger.submit_transaction(envelope).await {
                Ok(response) => classifier::assess_response(&response),
                Err(err) => {
                    warn!(payment_id = %envelope.payment_id, attempt, error = %err, "ledger transport failure");
                    classifier::assess_transport(&err)
                }
            };

            match verdict {
                SubmissionVerdict::Succeeded(txid) => {
                    info!(payment_id = %envelope.payment_id, attempt, %txid, "transaction accepted");
                    return Ok(txid);
                }
                SubmissionVerdict::Failed(err) => {
                    warn!(payment_id = %envelope.payment_id, attempt, error = %err, "transaction submission failed");
                    return Err(err);
                }
                SubmissionVerdict::Retry(reason) => {
                    if envelope.is_expired((self.time_fn)()) {
                        warn!(
                            payment_id = %envelope.payment_id,
                            attempt,
                            max_time = envelope.max_time,
                            "validity window closed while retrying"
                        );
                        return Err(PaymentError::submission_timed_out());
                    }
                    warn!(
                        payment_id = %envelope.payment_id,
                        attempt,
                        ?reason,
                        delay_ms = self.config.retry_delay_millis,
                        "retrying transaction submission"
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
            }
        }
    }
}
