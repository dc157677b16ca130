//! PaymentTransaction aggregate entity.
//!
//! A PaymentTransaction tracks one Payme payment from creation through
//! completion or cancellation. The provider issues the transaction id and is
//! the only party that ever refers to it, so the id is the sole lookup key.
//!
//! # Design Decisions
//!
//! - **Money in minor units**: amounts are i64 tiyin (1/100 sum), never floats
//! - **Millisecond timestamps**: the Payme wire protocol uses ms since epoch
//! - **Monotonic state machine**: no transition leaves a cancelled state

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a payment transaction.
///
/// Wire codes follow the Paycom protocol: 1 created, 2 completed,
/// -1 cancelled before completion, -2 cancelled after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Created, awaiting PerformTransaction.
    Created,

    /// Funds captured, access granted.
    Completed,

    /// Cancelled before completion.
    Cancelled,

    /// Cancelled after completion (provider-side reversal).
    CancelledAfterComplete,
}

impl TransactionState {
    /// Protocol wire code for this state.
    pub fn code(&self) -> i32 {
        match self {
            TransactionState::Created => 1,
            TransactionState::Completed => 2,
            TransactionState::Cancelled => -1,
            TransactionState::CancelledAfterComplete => -2,
        }
    }

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Cancelled | TransactionState::CancelledAfterComplete
        )
    }

    /// Check if the requested transition is allowed by the state machine.
    pub fn can_transition_to(&self, next: TransactionState) -> bool {
        matches!(
            (self, next),
            (TransactionState::Created, TransactionState::Completed)
                | (TransactionState::Created, TransactionState::Cancelled)
                | (
                    TransactionState::Completed,
                    TransactionState::CancelledAfterComplete
                )
        )
    }
}

/// Errors raised by invalid aggregate operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// The requested state transition violates the state machine.
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: TransactionState,
        to: TransactionState,
    },
}

/// PaymentTransaction aggregate - one in-flight Payme payment.
///
/// # Invariants
///
/// - `id` is unique and is the only lookup key
/// - `perform_time > 0` iff state is Completed or CancelledAfterComplete
/// - `cancel_time > 0` and `reason` is set iff state is a cancelled state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Provider-issued transaction identifier.
    pub id: String,

    /// Client-supplied transaction timestamp (ms since epoch, opaque).
    pub time: i64,

    /// Amount in minor currency units (tiyin).
    pub amount: i64,

    /// Free-form account object identifying the payable (carries `order_id`).
    pub account: serde_json::Map<String, serde_json::Value>,

    /// Current lifecycle state.
    pub state: TransactionState,

    /// Server timestamp when the transaction was created (ms).
    pub create_time: i64,

    /// Server timestamp when the transaction completed (ms, 0 until reached).
    pub perform_time: i64,

    /// Server timestamp when the transaction was cancelled (ms, 0 until reached).
    pub cancel_time: i64,

    /// Provider cancellation reason code, present only after cancellation.
    pub reason: Option<i32>,
}

impl PaymentTransaction {
    /// Create a new transaction in the Created state.
    pub fn create(
        id: impl Into<String>,
        time: i64,
        amount: i64,
        account: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            time,
            amount,
            account,
            state: TransactionState::Created,
            create_time: now_millis(),
            perform_time: 0,
            cancel_time: 0,
            reason: None,
        }
    }

    /// The `order_id` field of the account object, if present and a string.
    pub fn order_id(&self) -> Option<&str> {
        self.account.get("order_id").and_then(|v| v.as_str())
    }

    /// Complete this transaction, stamping `perform_time`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the transaction is Created.
    /// Idempotent re-completion is a caller concern: an already Completed
    /// transaction must be answered from the stored record, not re-performed.
    pub fn perform(&mut self) -> Result<(), TransactionError> {
        self.transition_to(TransactionState::Completed)?;
        self.perform_time = now_millis();
        Ok(())
    }

    /// Cancel this transaction, stamping `cancel_time` and `reason`.
    ///
    /// A Created transaction becomes Cancelled; a Completed one becomes
    /// CancelledAfterComplete.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the transaction is already in a
    /// cancelled state.
    pub fn cancel(&mut self, reason: i32) -> Result<(), TransactionError> {
        let target = match self.state {
            TransactionState::Created => TransactionState::Cancelled,
            _ => TransactionState::CancelledAfterComplete,
        };
        self.transition_to(target)?;
        self.cancel_time = now_millis();
        self.reason = Some(reason);
        Ok(())
    }

    fn transition_to(&mut self, next: TransactionState) -> Result<(), TransactionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransactionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(order_id: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("order_id".into(), serde_json::Value::from(order_id));
        map
    }

    fn created() -> PaymentTransaction {
        PaymentTransaction::create("t1", 1000, 500_000, account("o1"))
    }

    // ══════════════════════════════════════════════════════════════
    // State Machine Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn wire_codes_match_protocol() {
        assert_eq!(TransactionState::Created.code(), 1);
        assert_eq!(TransactionState::Completed.code(), 2);
        assert_eq!(TransactionState::Cancelled.code(), -1);
        assert_eq!(TransactionState::CancelledAfterComplete.code(), -2);
    }

    #[test]
    fn cancelled_states_are_terminal() {
        assert!(TransactionState::Cancelled.is_terminal());
        assert!(TransactionState::CancelledAfterComplete.is_terminal());
        assert!(!TransactionState::Created.is_terminal());
        assert!(!TransactionState::Completed.is_terminal());
    }

    #[test]
    fn allowed_transitions() {
        assert!(TransactionState::Created.can_transition_to(TransactionState::Completed));
        assert!(TransactionState::Created.can_transition_to(TransactionState::Cancelled));
        assert!(
            TransactionState::Completed.can_transition_to(TransactionState::CancelledAfterComplete)
        );
    }

    #[test]
    fn no_transition_out_of_cancelled() {
        for next in [
            TransactionState::Created,
            TransactionState::Completed,
            TransactionState::Cancelled,
            TransactionState::CancelledAfterComplete,
        ] {
            assert!(!TransactionState::Cancelled.can_transition_to(next));
            assert!(!TransactionState::CancelledAfterComplete.can_transition_to(next));
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Aggregate Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn create_initializes_created_state() {
        let tx = created();
        assert_eq!(tx.state, TransactionState::Created);
        assert!(tx.create_time > 0);
        assert_eq!(tx.perform_time, 0);
        assert_eq!(tx.cancel_time, 0);
        assert_eq!(tx.reason, None);
        assert_eq!(tx.order_id(), Some("o1"));
    }

    #[test]
    fn perform_stamps_perform_time() {
        let mut tx = created();
        tx.perform().unwrap();
        assert_eq!(tx.state, TransactionState::Completed);
        assert!(tx.perform_time > 0);
    }

    #[test]
    fn perform_twice_fails_at_aggregate_level() {
        let mut tx = created();
        tx.perform().unwrap();
        let err = tx.perform().unwrap_err();
        assert_eq!(
            err,
            TransactionError::InvalidTransition {
                from: TransactionState::Completed,
                to: TransactionState::Completed,
            }
        );
    }

    #[test]
    fn cancel_created_yields_cancelled() {
        let mut tx = created();
        tx.cancel(3).unwrap();
        assert_eq!(tx.state, TransactionState::Cancelled);
        assert!(tx.cancel_time > 0);
        assert_eq!(tx.reason, Some(3));
        assert_eq!(tx.perform_time, 0);
    }

    #[test]
    fn cancel_completed_yields_cancelled_after_complete() {
        let mut tx = created();
        tx.perform().unwrap();
        tx.cancel(5).unwrap();
        assert_eq!(tx.state, TransactionState::CancelledAfterComplete);
        assert!(tx.cancel_time > 0);
        assert_eq!(tx.reason, Some(5));
        // perform_time survives cancellation
        assert!(tx.perform_time > 0);
    }

    #[test]
    fn cancel_twice_fails() {
        let mut tx = created();
        tx.cancel(1).unwrap();
        assert!(tx.cancel(1).is_err());
    }

    #[test]
    fn missing_order_id_is_none() {
        let tx = PaymentTransaction::create("t2", 0, 1, serde_json::Map::new());
        assert_eq!(tx.order_id(), None);
    }
}
