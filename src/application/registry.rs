use crate::domain::payment::Payment;
use crate::domain::ports::PaymentStoreBox;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Payments that are open on this process, plus per-payment exclusive access.
///
/// The registry is not the system of record; the platform API is. It only
/// remembers payments between creation and submission, and guarantees that
/// at most one submission workflow runs per payment identifier.
///
/// Locking is per identifier: workflows for unrelated payments run
/// concurrently, while two workflows for the same payment queue up. Lock
/// entries are created on demand and dropped once no holder or waiter is
/// left.
pub struct PaymentRegistry {
    store: PaymentStoreBox,
    locks: LockTable,
}

/// Exclusive access to one payment identifier, released on drop.
pub struct PaymentLock {
    payment_id: String,
    locks: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PaymentLock {
    pub fn payment_id(&self) -> &str {
        &self.payment_id
    }
}

impl Drop for PaymentLock {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.locks.lock();
        // Only the table's own reference left: nobody holds or awaits it.
        let idle = table
            .get(&self.payment_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if idle {
            table.remove(&self.payment_id);
        }
    }
}

impl PaymentRegistry {
    pub fn new(store: PaymentStoreBox) -> Self {
        Self {
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Inserts or overwrites the record for `payment_id`.
    pub async fn put(&self, payment_id: &str, payment: Payment) -> Result<()> {
        self.store.put(payment_id, payment).await
    }

    pub async fn get(&self, payment_id: &str) -> Result<Option<Payment>> {
        self.store.get(payment_id).await
    }

    /// Removes the record; removing an absent id is a no-op.
    pub async fn remove(&self, payment_id: &str) -> Result<()> {
        self.store.remove(payment_id).await
    }

    pub async fn ids(&self) -> Result<Vec<String>> {
        self.store.ids().await
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.store.ids().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Waits for exclusive access to `payment_id`.
    pub async fn lock(&self, payment_id: &str) -> PaymentLock {
        let entry = {
            let mut table = self.locks.lock();
            table.entry(payment_id.to_string()).or_default().clone()
        };
        let guard = entry.lock_owned().await;
        PaymentLock {
            payment_id: payment_id.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Runs `f` while holding exclusive access to `payment_id`.
    ///
    /// `f` may call back into the registry and perform I/O; the lock is held
    /// until its future completes.
    pub async fn with_exclusive<F, Fut, T>(&self, payment_id: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _lock = self.lock(payment_id).await;
        f().await
    }

    /// Number of identifiers with a live lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks.lock().len()
    }
}
