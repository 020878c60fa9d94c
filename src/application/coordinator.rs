use super::builder::TransactionBuilder;
use super::registry::PaymentRegistry;
use super::submission::SubmissionCoordinator;
use crate::config::{SubmissionConfig, TimeFn, system_time};
use crate::domain::payment::{Payment, PaymentData};
use crate::domain::ports::{LedgerClientFactory, PaymentStoreBox, PlatformApiBox};
use crate::domain::wallet::Wallet;
use crate::error::{PaymentError, Result};
use tracing::{info, warn};

/// The main entry point for app-to-user payments.
///
/// `PaymentCoordinator` creates payments on the platform, keeps them in the
/// registry until they are submitted, and drives each submission to a
/// terminal outcome on the ledger.
pub struct PaymentCoordinator {
    platform: PlatformApiBox,
    ledgers: LedgerClientFactory,
    registry: PaymentRegistry,
    wallet: Wallet,
    builder: TransactionBuilder,
    submitter: SubmissionCoordinator,
}

impl PaymentCoordinator {
    /// Creates a new `PaymentCoordinator`.
    ///
    /// # Arguments
    ///
    /// * `platform` - Client for the platform REST API.
    /// * `ledgers` - Resolves the ledger client for a payment's network.
    /// * `store` - Backing store for the open-payment registry.
    /// * `wallet` - The app wallet that signs payment transactions.
    /// * `config` - Submission timeout, retry delay and fee.
    pub fn new(
        platform: PlatformApiBox,
        ledgers: LedgerClientFactory,
        store: PaymentStoreBox,
        wallet: Wallet,
        config: SubmissionConfig,
    ) -> Self {
        Self::with_time_fn(platform, ledgers, store, wallet, config, system_time())
    }

    /// Like [`PaymentCoordinator::new`] with an explicit clock (unix seconds).
    pub fn with_time_fn(
        platform: PlatformApiBox,
        ledgers: LedgerClientFactory,
        store: PaymentStoreBox,
        wallet: Wallet,
        config: SubmissionConfig,
        time_fn: TimeFn,
    ) -> Self {
        Self {
            platform,
            ledgers,
            registry: PaymentRegistry::new(store),
            wallet,
            builder: TransactionBuilder::new(config.clone(), time_fn.clone()),
            submitter: SubmissionCoordinator::new(config, time_fn),
        }
    }

    pub fn wallet_address(&self) -> &str {
        self.wallet.address()
    }

    pub fn registry(&self) -> &PaymentRegistry {
        &self.registry
    }

    /// Creates the payment on the platform and registers it as open.
    ///
    /// Returns the platform-assigned identifier.
    pub async fn create_payment(&self, data: &PaymentData) -> Result<String> {
        data.validate()?;

        let payment = self.platform.create_payment(data).await?;
        let payment_id = payment.identifier.clone();
        self.registry.put(&payment_id, payment).await?;

        info!(payment_id = %payment_id, "payment created");
        Ok(payment_id)
    }

    /// Builds, signs and submits the ledger transaction for `payment_id`.
    ///
    /// Holds the payment's exclusive lock for the whole workflow, so a payment
    /// is never submitted twice concurrently. The payment leaves the registry
    /// once submission reaches a terminal outcome. A failed registry cleanup
    /// is logged and never replaces that outcome.
    pub async fn submit_payment(&self, payment_id: &str) -> Result<String> {
        self.registry
            .with_exclusive(payment_id, move || async move {
                let outcome = match self.resolve_payment(payment_id).await {
                    Ok(payment) => self.build_and_submit(&payment).await,
                    Err(err) => Err(err),
                };
                self.forget(payment_id).await;
                outcome
            })
            .await
    }

    /// Drops `payment_id` from the registry, logging store failures.
    async fn forget(&self, payment_id: &str) {
        if let Err(err) = self.registry.remove(payment_id).await {
            warn!(payment_id, error = %err, "failed to drop payment from registry");
        }
    }

    /// Registry hit, or a fresh platform fetch on miss.
    ///
    /// A payment that already has a linked txid is never submitted again.
    async fn resolve_payment(&self, payment_id: &str) -> Result<Payment> {
        let payment = match self.registry.get(payment_id).await? {
            Some(payment) if payment.identifier == payment_id => payment,
            _ => self.platform.get_payment(payment_id).await?,
        };

        if let Some(txid) = payment.linked_txid() {
            warn!(payment_id, txid, "payment already linked to a transaction");
            return Err(PaymentError::TxidAlreadyLinked {
                payment_id: payment_id.to_string(),
                txid: txid.to_string(),
            });
        }
        Ok(payment)
    }

    async fn build_and_submit(&self, payment: &Payment) -> Result<String> {
        let ledger = (self.ledgers)(&payment.network);
        let envelope = self
            .builder
            .build(ledger.as_ref(), &self.wallet, payment)
            .await?;

        info!(
            payment_id = %payment.identifier,
            network = %payment.network,
            hash = %envelope.hash,
            "submitting payment transaction"
        );
        self.submitter.submit(ledger.as_ref(), &envelope).await
    }

    /// Marks the payment complete on the platform.
    ///
    /// The payment leaves the registry even if the platform call fails.
    pub async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<Payment> {
        let result = self.platform.complete_payment(payment_id, txid).await;
        self.forget(payment_id).await;
        if let Err(err) = &result {
            warn!(payment_id, error = %err, "failed to complete payment");
        }
        result
    }

    /// Cancels the payment on the platform.
    ///
    /// The payment leaves the registry even if the platform call fails.
    pub async fn cancel_payment(&self, payment_id: &str) -> Result<Payment> {
        let result = self.platform.cancel_payment(payment_id).await;
        self.forget(payment_id).await;
        if let Err(err) = &result {
            warn!(payment_id, error = %err, "failed to cancel payment");
        }
        result
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        self.platform.get_payment(payment_id).await
    }

    pub async fn get_incomplete_server_payments(&self) -> Result<Vec<Payment>> {
        self.platform.incomplete_server_payments().await
    }
}
