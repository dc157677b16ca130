//! In-memory transaction store.
//!
//! A `Mutex<HashMap>` behind the `TransactionStore` port, honoring the same
//! uniqueness and compare-and-set contract as the Postgres adapter. Used in
//! tests and local development; it does not survive restarts, so production
//! deployments use the durable adapter.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::transaction::{PaymentTransaction, TransactionState};
use crate::ports::{StoreError, TransactionStore};

/// Non-durable `TransactionStore` keyed by transaction id.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: Mutex<HashMap<String, PaymentTransaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PaymentTransaction>> {
        // Poisoning only happens if a holder panicked; the map itself is
        // still usable for the webhook contract.
        match self.transactions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), StoreError> {
        let mut map = self.lock();
        if map.contains_key(&tx.id) {
            return Err(StoreError::DuplicateId(tx.id.clone()));
        }
        map.insert(tx.id.clone(), tx.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>, StoreError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn update_if_state(
        &self,
        tx: &PaymentTransaction,
        expected: TransactionState,
    ) -> Result<(), StoreError> {
        let mut map = self.lock();
        match map.get_mut(&tx.id) {
            Some(stored) if stored.state == expected => {
                *stored = tx.clone();
                Ok(())
            }
            _ => Err(StoreError::StaleState {
                id: tx.id.clone(),
                expected,
            }),
        }
    }

    async fn list_created_between(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<PaymentTransaction>, StoreError> {
        let mut matched: Vec<PaymentTransaction> = self
            .lock()
            .values()
            .filter(|tx| tx.create_time >= from && tx.create_time <= to)
            .cloned()
            .collect();
        matched.sort_by_key(|tx| tx.create_time);
        Ok(matched)
    }
}
