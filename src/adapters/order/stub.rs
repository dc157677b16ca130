//! Stub order service.
//!
//! Stands in for the payment orchestrator until the gateways are wired into
//! the surrounding application. Orders are seeded up front; payment outcomes
//! are recorded in memory so tests can assert on them.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::ports::{Order, OrderError, OrderService};

/// In-memory `OrderService` with seeded orders and recorded outcomes.
#[derive(Default)]
pub struct StubOrderService {
    orders: Mutex<HashMap<String, Order>>,
    paid: Mutex<Vec<(String, String)>>,
    granted: Mutex<Vec<String>>,
    revoked: Mutex<Vec<String>>,
}

impl StubOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order the stub will resolve.
    pub fn with_order(self, order: Order) -> Self {
        self.lock(&self.orders).insert(order.id.clone(), order);
        self
    }

    /// `(order_id, provider_ref)` pairs recorded by `mark_paid`.
    pub fn paid(&self) -> Vec<(String, String)> {
        self.lock(&self.paid).clone()
    }

    /// Order ids recorded by `grant_access`.
    pub fn granted(&self) -> Vec<String> {
        self.lock(&self.granted).clone()
    }

    /// Order ids recorded by `revoke_access`.
    pub fn revoked(&self) -> Vec<String> {
        self.lock(&self.revoked).clone()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl OrderService for StubOrderService {
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.lock(&self.orders).get(order_id).cloned())
    }

    async fn mark_paid(&self, order_id: &str, provider_ref: &str) -> Result<(), OrderError> {
        info!(order = order_id, provider_ref, "stub: order marked paid");
        if let Some(order) = self.lock(&self.orders).get_mut(order_id) {
            order.payable = false;
        }
        self.lock(&self.paid)
            .push((order_id.to_string(), provider_ref.to_string()));
        Ok(())
    }

    async fn grant_access(&self, order_id: &str) -> Result<(), OrderError> {
        info!(order = order_id, "stub: access granted");
        self.lock(&self.granted).push(order_id.to_string());
        Ok(())
    }

    async fn revoke_access(&self, order_id: &str) -> Result<(), OrderError> {
        info!(order = order_id, "stub: access revoked");
        self.lock(&self.revoked).push(order_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payable_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            amount: 500_000,
            payable: true,
        }
    }

    #[tokio::test]
    async fn seeded_order_is_found() {
        let stub = StubOrderService::new().with_order(payable_order("o1"));
        let order = stub.find_order("o1").await.unwrap().unwrap();
        assert_eq!(order.amount, 500_000);
        assert!(order.payable);
    }

    #[tokio::test]
    async fn unknown_order_is_none() {
        let stub = StubOrderService::new();
        assert!(stub.find_order("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_paid_records_and_closes_the_order() {
        let stub = StubOrderService::new().with_order(payable_order("o1"));
        stub.mark_paid("o1", "tx-9").await.unwrap();

        assert_eq!(stub.paid(), vec![("o1".to_string(), "tx-9".to_string())]);
        assert!(!stub.find_order("o1").await.unwrap().unwrap().payable);
    }

    #[tokio::test]
    async fn grant_and_revoke_are_recorded() {
        let stub = StubOrderService::new().with_order(payable_order("o1"));
        stub.grant_access("o1").await.unwrap();
        stub.revoke_access("o1").await.unwrap();

        assert_eq!(stub.granted(), vec!["o1".to_string()]);
        assert_eq!(stub.revoked(), vec!["o1".to_string()]);
    }
}
