//! Transaction store port.
//!
//! Keyed persistence for in-flight Payme transactions. Provider webhook
//! retries assume durability, so the production adapter must be a durable
//! uniquely-keyed store; state transitions go through a compare-and-set so
//! concurrent retries for the same transaction id cannot race on
//! read-modify-write.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::transaction::{PaymentTransaction, TransactionState};

/// Port for payment transaction persistence.
///
/// `id` is the only lookup key and must be unique.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateId` if a transaction with this id
    /// already exists; callers resolve the race by re-reading.
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), StoreError>;

    /// Look up a transaction by provider id.
    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>, StoreError>;

    /// Persist a state transition, guarded by the expected current state.
    ///
    /// The update applies only if the stored state still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::StaleState` when the guard fails; callers
    /// re-read and re-apply their idempotency rules.
    async fn update_if_state(
        &self,
        tx: &PaymentTransaction,
        expected: TransactionState,
    ) -> Result<(), StoreError>;

    /// List transactions whose `create_time` lies in `[from, to]` inclusive,
    /// ordered by `create_time`.
    async fn list_created_between(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<PaymentTransaction>, StoreError>;
}

/// Errors from transaction store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transaction with this id already exists.
    #[error("Transaction {0} already exists")]
    DuplicateId(String),

    /// The guarded update found a different state than expected.
    #[error("Transaction {id} is no longer in state {expected:?}")]
    StaleState {
        id: String,
        expected: TransactionState,
    },

    /// Underlying storage failure.
    #[error("Storage error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn TransactionStore) {}
    }

    #[test]
    fn stale_state_displays_id_and_state() {
        let err = StoreError::StaleState {
            id: "t1".into(),
            expected: TransactionState::Created,
        };
        assert!(err.to_string().contains("t1"));
        assert!(err.to_string().contains("Created"));
    }
}
