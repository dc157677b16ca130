//! Payment transaction domain model.

mod aggregate;

pub use aggregate::{PaymentTransaction, TransactionError, TransactionState};
