//! Ports - trait boundaries between the gateways and infrastructure.

mod order_service;
mod transaction_store;

pub use order_service::{Order, OrderError, OrderService};
pub use transaction_store::{StoreError, TransactionStore};
