//! Order service port - the Payment Orchestrator boundary.
//!
//! The surrounding application owns orders and the resources they unlock;
//! the gateways only need to validate an order before accepting payment and
//! to notify the orchestrator of payment outcomes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A payable order as seen by the gateways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Application order id (`merchant_trans_id` / `account.order_id`).
    pub id: String,

    /// Price in minor currency units (tiyin).
    pub amount: i64,

    /// Whether the order can currently accept payment.
    pub payable: bool,
}

/// Port into the payment orchestrator.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Look up an order for pre-payment validation.
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, OrderError>;

    /// Record that the order was paid, with the provider's transaction
    /// reference for reconciliation.
    async fn mark_paid(&self, order_id: &str, provider_ref: &str) -> Result<(), OrderError>;

    /// Unlock the purchased resource (course, event, subscription).
    async fn grant_access(&self, order_id: &str) -> Result<(), OrderError>;

    /// Re-lock the resource after a post-completion cancellation.
    async fn revoke_access(&self, order_id: &str) -> Result<(), OrderError>;
}

/// Errors from orchestrator calls.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Underlying application/storage failure.
    #[error("Order service error: {0}")]
    Infrastructure(String),
}
