use crate::domain::payment::Payment;
use crate::domain::ports::PaymentStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for open payments.
///
/// Uses `Arc<RwLock<HashMap<String, Payment>>>` to allow shared concurrent access.
/// Contents are lost when the process exits.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<String, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn put(&self, payment_id: &str, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment_id.to_string(), payment);
        Ok(())
    }

    async fn get(&self, payment_id: &str) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(payment_id).cloned())
    }

    async fn remove(&self, payment_id: &str) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.remove(payment_id);
        Ok(())
    }

    async fn ids(&self) -> Result<Vec<String>> {
        let payments = self.payments.read().await;
        Ok(payments.keys().cloned().collect())
    }
}
