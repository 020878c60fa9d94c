#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pi_a2u::application::coordinator::PaymentCoordinator;
use pi_a2u::config::{SubmissionConfig, TimeFn};
use pi_a2u::domain::payment::{Payment, PaymentData, PaymentTransaction};
use pi_a2u::domain::ports::{
    LedgerClient, LedgerClientBox, LedgerResponse, LedgerTransportError, PaymentStore,
    PaymentStoreBox, PlatformApi,
};
use pi_a2u::domain::transaction::TransactionEnvelope;
use pi_a2u::domain::wallet::Wallet;
use pi_a2u::error::{PaymentError, Result};
use pi_a2u::infrastructure::in_memory::InMemoryPaymentStore;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SEED: &str = "SC2L62EYF7LYF43L4OOSKUKDESRAFJZW3UW6RFZ57UY25VAMHTL2BFER";
pub const RECIPIENT: &str = "GDCTIXFMVAHYKHRH6SN5PEH5432426NTV2LYFHRP4BBGN5SR4GPCPT2A";

pub fn wallet() -> Wallet {
    Wallet::from_seed(SEED).unwrap()
}

pub fn payment_data() -> PaymentData {
    PaymentData::new(dec!(1), "test", "test-uid").with_metadata(json!({"info": "test"}))
}

/// A payment from the app wallet to `RECIPIENT`.
pub fn payment(payment_id: &str) -> Payment {
    Payment {
        identifier: payment_id.to_string(),
        network: "Pi Network".to_string(),
        amount: Some(dec!(3.14)),
        from_address: wallet().address().to_string(),
        to_address: Some(RECIPIENT.to_string()),
        ..Default::default()
    }
}

pub fn linked_payment(payment_id: &str, txid: &str) -> Payment {
    Payment {
        transaction: Some(PaymentTransaction {
            txid: Some(txid.to_string()),
            verified: true,
            link: None,
        }),
        ..payment(payment_id)
    }
}

#[derive(Default)]
struct PlatformState {
    payments: HashMap<String, Payment>,
    created: usize,
    fetched: Vec<String>,
    completed: Vec<(String, String)>,
    cancelled: Vec<String>,
}

/// In-process platform API. Creates payments with random identifiers.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
    fail_notifications: Arc<Mutex<bool>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `payment` fetchable by its identifier.
    pub fn insert(&self, payment: Payment) {
        self.state
            .lock()
            .payments
            .insert(payment.identifier.clone(), payment);
    }

    pub fn fail_notifications(&self) {
        *self.fail_notifications.lock() = true;
    }

    pub fn created(&self) -> usize {
        self.state.lock().created
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().fetched.clone()
    }

    pub fn completed(&self) -> Vec<(String, String)> {
        self.state.lock().completed.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().cancelled.clone()
    }

    fn notification_result(&self, payment_id: &str) -> Result<Payment> {
        if *self.fail_notifications.lock() {
            return Err(PaymentError::ApiRequest {
                message: "Platform unavailable".to_string(),
                status: 503,
                body: String::new(),
            });
        }
        Ok(payment(payment_id))
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn create_payment(&self, data: &PaymentData) -> Result<Payment> {
        let identifier: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        let created = Payment {
            amount: data.amount,
            memo: data.memo.clone(),
            ..payment(&identifier)
        };

        let mut state = self.state.lock();
        state.created += 1;
        state.payments.insert(identifier, created.clone());
        Ok(created)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        let mut state = self.state.lock();
        state.fetched.push(payment_id.to_string());
        state
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| PaymentError::PaymentNotFound {
                payment_id: payment_id.to_string(),
            })
    }

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<Payment> {
        self.state
            .lock()
            .completed
            .push((payment_id.to_string(), txid.to_string()));
        self.notification_result(payment_id)
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<Payment> {
        self.state.lock().cancelled.push(payment_id.to_string());
        self.notification_result(payment_id)
    }

    async fn incomplete_server_payments(&self) -> Result<Vec<Payment>> {
        Ok(self.state.lock().payments.values().cloned().collect())
    }
}

/// In-memory store whose `remove` always fails.
#[derive(Default)]
pub struct StickyStore {
    inner: InMemoryPaymentStore,
}

#[async_trait]
impl PaymentStore for StickyStore {
    async fn put(&self, payment_id: &str, payment: Payment) -> Result<()> {
        self.inner.put(payment_id, payment).await
    }

    async fn get(&self, payment_id: &str) -> Result<Option<Payment>> {
        self.inner.get(payment_id).await
    }

    async fn remove(&self, _payment_id: &str) -> Result<()> {
        Err(PaymentError::Ledger("store down".to_string()))
    }

    async fn ids(&self) -> Result<Vec<String>> {
        self.inner.ids().await
    }
}

pub type Reply = std::result::Result<LedgerResponse, LedgerTransportError>;

pub fn reply(status: u16, body: Value) -> Reply {
    Ok(LedgerResponse { status, body })
}

pub fn accepted(txid: &str) -> Reply {
    reply(200, json!({ "id": txid }))
}

/// In-process ledger replaying scripted submission replies.
///
/// The last reply repeats once the script runs out.
#[derive(Clone)]
pub struct FakeLedger {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    submissions: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    networks: Arc<Mutex<Vec<String>>>,
}

impl FakeLedger {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            submissions: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            networks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Highest number of `submit_transaction` calls seen running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn networks(&self) -> Vec<String> {
        self.networks.lock().clone()
    }

    pub fn client_for(&self, network: &str) -> LedgerClientBox {
        self.networks.lock().push(network.to_string());
        Box::new(self.clone())
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn account_sequence(&self, _address: &str) -> Result<i64> {
        Ok(1)
    }

    async fn submit_transaction(&self, _envelope: &TransactionEnvelope) -> Reply {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let reply = {
            let mut replies = self.replies.lock();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            }
        };
        // Let any other submission that could run now do so.
        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Unix seconds that follow tokio's clock, so paused-time tests can drive
/// the validity window.
pub fn tokio_clock() -> TimeFn {
    let start = tokio::time::Instant::now();
    Arc::new(move || 1_700_000_000 + start.elapsed().as_secs())
}

pub fn config(timeout_secs: u64, retry_delay_millis: u64) -> SubmissionConfig {
    SubmissionConfig {
        submission_timeout_secs: timeout_secs,
        retry_delay_millis,
        ..Default::default()
    }
}

pub fn coordinator(
    platform: &FakePlatform,
    ledger: &FakeLedger,
    config: SubmissionConfig,
) -> PaymentCoordinator {
    coordinator_with_store(platform, ledger, Box::new(InMemoryPaymentStore::new()), config)
}

pub fn coordinator_with_store(
    platform: &FakePlatform,
    ledger: &FakeLedger,
    store: PaymentStoreBox,
    config: SubmissionConfig,
) -> PaymentCoordinator {
    let ledger = ledger.clone();
    PaymentCoordinator::with_time_fn(
        Box::new(platform.clone()),
        Box::new(move |network: &str| ledger.client_for(network)),
        store,
        wallet(),
        config,
        tokio_clock(),
    )
}
