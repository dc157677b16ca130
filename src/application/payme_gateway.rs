//! Payme gateway - JSON-RPC method dispatch over the transaction store.
//!
//! Implements the six Paycom merchant API methods. Every call is
//! authenticated with Basic credentials before dispatch, and every outcome
//! (success or error) is wrapped in a JSON-RPC envelope echoing the caller's
//! id; nothing escapes to the transport layer unformatted.
//!
//! Idempotency is a designed property: providers retry on ambiguous network
//! failures, so repeated CreateTransaction / PerformTransaction /
//! CancelTransaction calls return the stored result instead of erroring.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::PaymeConfig;
use crate::domain::payme::{verify_basic_auth, PaymeError, RpcRequest, RpcResponse};
use crate::domain::transaction::{PaymentTransaction, TransactionState};
use crate::ports::{OrderService, StoreError, TransactionStore};

/// Gateway handling Payme JSON-RPC webhook calls.
pub struct PaymeGateway {
    store: Arc<dyn TransactionStore>,
    orders: Arc<dyn OrderService>,
    config: PaymeConfig,
}

#[derive(Debug, Deserialize)]
struct CheckPerformParams {
    amount: i64,
    #[serde(default)]
    account: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    id: String,
    time: i64,
    amount: i64,
    #[serde(default)]
    account: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TransactionIdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CancelParams {
    id: String,
    #[serde(default)]
    reason: i32,
}

#[derive(Debug, Deserialize)]
struct StatementParams {
    from: i64,
    to: i64,
}

impl PaymeGateway {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        orders: Arc<dyn OrderService>,
        config: PaymeConfig,
    ) -> Self {
        Self {
            store,
            orders,
            config,
        }
    }

    /// Handle one inbound JSON-RPC call.
    ///
    /// Always returns a well-formed envelope; authentication and dispatch
    /// failures become JSON-RPC error objects, never transport errors.
    pub async fn handle(&self, authorization: Option<&str>, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();

        if let Err(err) = verify_basic_auth(authorization, &self.config.secret_key) {
            warn!(method = %request.method, "payme authorization rejected");
            return RpcResponse::error(id, err.to_rpc_error());
        }

        match self.dispatch(&request).await {
            Ok(result) => {
                debug!(method = %request.method, "payme method handled");
                RpcResponse::success(id, result)
            }
            Err(err) => {
                warn!(method = %request.method, code = err.code(), %err, "payme method failed");
                RpcResponse::error(id, err.to_rpc_error())
            }
        }
    }

    async fn dispatch(&self, request: &RpcRequest) -> Result<Value, PaymeError> {
        match request.method.as_str() {
            "CheckPerformTransaction" => {
                self.check_perform_transaction(parse_params(&request.params)?)
                    .await
            }
            "CreateTransaction" => self.create_transaction(parse_params(&request.params)?).await,
            "PerformTransaction" => {
                self.perform_transaction(parse_params(&request.params)?)
                    .await
            }
            "CancelTransaction" => self.cancel_transaction(parse_params(&request.params)?).await,
            "CheckTransaction" => self.check_transaction(parse_params(&request.params)?).await,
            "GetStatement" => self.get_statement(parse_params(&request.params)?).await,
            other => Err(PaymeError::MethodNotFound(other.to_string())),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Methods
    // ════════════════════════════════════════════════════════════════════════

    async fn check_perform_transaction(
        &self,
        params: CheckPerformParams,
    ) -> Result<Value, PaymeError> {
        self.validate_order(&params.account, params.amount).await?;
        Ok(json!({ "allow": true }))
    }

    async fn create_transaction(&self, params: CreateParams) -> Result<Value, PaymeError> {
        if let Some(existing) = self.find(&params.id).await? {
            return replay_create(&existing);
        }

        self.validate_order(&params.account, params.amount).await?;

        let tx = PaymentTransaction::create(
            params.id.clone(),
            params.time,
            params.amount,
            params.account,
        );
        match self.store.insert(&tx).await {
            Ok(()) => Ok(create_result(&tx)),
            // Lost a create race with a concurrent retry; answer from the
            // winner's record.
            Err(StoreError::DuplicateId(_)) => {
                let existing = self
                    .find(&params.id)
                    .await?
                    .ok_or(PaymeError::TransactionNotFound)?;
                replay_create(&existing)
            }
            Err(err) => Err(internal(err)),
        }
    }

    async fn perform_transaction(&self, params: TransactionIdParams) -> Result<Value, PaymeError> {
        let tx = self
            .find(&params.id)
            .await?
            .ok_or(PaymeError::TransactionNotFound)?;

        match tx.state {
            // Provider retry of an already completed transaction: same
            // result, no second perform_time stamp.
            TransactionState::Completed => Ok(perform_result(&tx)),
            TransactionState::Created => {
                let mut updated = tx;
                updated
                    .perform()
                    .map_err(|_| PaymeError::UnableToPerform)?;

                match self
                    .store
                    .update_if_state(&updated, TransactionState::Created)
                    .await
                {
                    Ok(()) => {
                        self.settle_order(&updated).await;
                        Ok(perform_result(&updated))
                    }
                    Err(StoreError::StaleState { .. }) => {
                        let current = self
                            .find(&params.id)
                            .await?
                            .ok_or(PaymeError::TransactionNotFound)?;
                        match current.state {
                            TransactionState::Completed => Ok(perform_result(&current)),
                            _ => Err(PaymeError::UnableToPerform),
                        }
                    }
                    Err(err) => Err(internal(err)),
                }
            }
            _ => Err(PaymeError::UnableToPerform),
        }
    }

    async fn cancel_transaction(&self, params: CancelParams) -> Result<Value, PaymeError> {
        let tx = self
            .find(&params.id)
            .await?
            .ok_or(PaymeError::TransactionNotFound)?;

        // Already cancelled: idempotent replay for provider retries.
        if tx.state.is_terminal() {
            return Ok(cancel_result(&tx));
        }

        let expected = tx.state;
        let mut updated = tx;
        updated
            .cancel(params.reason)
            .map_err(|_| PaymeError::UnableToPerform)?;

        match self.store.update_if_state(&updated, expected).await {
            Ok(()) => {
                if expected == TransactionState::Completed {
                    self.revoke_order(&updated).await;
                }
                Ok(cancel_result(&updated))
            }
            Err(StoreError::StaleState { .. }) => {
                let current = self
                    .find(&params.id)
                    .await?
                    .ok_or(PaymeError::TransactionNotFound)?;
                if current.state.is_terminal() {
                    Ok(cancel_result(&current))
                } else {
                    Err(PaymeError::UnableToPerform)
                }
            }
            Err(err) => Err(internal(err)),
        }
    }

    async fn check_transaction(&self, params: TransactionIdParams) -> Result<Value, PaymeError> {
        let tx = self
            .find(&params.id)
            .await?
            .ok_or(PaymeError::TransactionNotFound)?;
        Ok(check_result(&tx))
    }

    async fn get_statement(&self, params: StatementParams) -> Result<Value, PaymeError> {
        let transactions = self
            .store
            .list_created_between(params.from, params.to)
            .await
            .map_err(internal)?;

        let entries: Vec<Value> = transactions.iter().map(statement_entry).collect();
        Ok(json!({ "transactions": entries }))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    async fn find(&self, id: &str) -> Result<Option<PaymentTransaction>, PaymeError> {
        self.store.find_by_id(id).await.map_err(internal)
    }

    /// Resolve `account.order_id` and check the order accepts this payment.
    async fn validate_order(
        &self,
        account: &serde_json::Map<String, Value>,
        amount: i64,
    ) -> Result<(), PaymeError> {
        let order_id = account
            .get("order_id")
            .and_then(|v| v.as_str())
            .ok_or(PaymeError::InvalidAccount)?;

        let order = self
            .orders
            .find_order(order_id)
            .await
            .map_err(internal)?
            .ok_or(PaymeError::InvalidAccount)?;

        if !order.payable {
            return Err(PaymeError::UnableToPerform);
        }
        if order.amount != amount {
            return Err(PaymeError::InvalidAmount);
        }
        Ok(())
    }

    /// Notify the orchestrator that the transaction completed. The state is
    /// already committed, so orchestrator failures are logged for
    /// reconciliation rather than surfaced: erroring here would make the
    /// provider retry a perform we cannot repeat.
    async fn settle_order(&self, tx: &PaymentTransaction) {
        let Some(order_id) = tx.order_id() else {
            error!(transaction = %tx.id, "completed transaction has no order_id");
            return;
        };
        if let Err(err) = self.orders.mark_paid(order_id, &tx.id).await {
            error!(transaction = %tx.id, order = order_id, %err, "mark_paid failed");
        }
        if let Err(err) = self.orders.grant_access(order_id).await {
            error!(transaction = %tx.id, order = order_id, %err, "grant_access failed");
        }
    }

    /// Revoke access after a post-completion cancellation. Money movement is
    /// the provider's side of the reversal.
    async fn revoke_order(&self, tx: &PaymentTransaction) {
        let Some(order_id) = tx.order_id() else {
            return;
        };
        if let Err(err) = self.orders.revoke_access(order_id).await {
            error!(transaction = %tx.id, order = order_id, %err, "revoke_access failed");
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, PaymeError> {
    serde_json::from_value(params.clone()).map_err(|e| PaymeError::InvalidParams(e.to_string()))
}

fn internal(err: impl std::fmt::Display) -> PaymeError {
    PaymeError::Internal(err.to_string())
}

/// Idempotent CreateTransaction replay: only a still-Created transaction is
/// re-creatable; any other state rejects the retry.
fn replay_create(existing: &PaymentTransaction) -> Result<Value, PaymeError> {
    match existing.state {
        TransactionState::Created => Ok(create_result(existing)),
        _ => Err(PaymeError::UnableToPerform),
    }
}

fn create_result(tx: &PaymentTransaction) -> Value {
    json!({
        "create_time": tx.create_time,
        "transaction": tx.id,
        "state": tx.state.code(),
    })
}

fn perform_result(tx: &PaymentTransaction) -> Value {
    json!({
        "transaction": tx.id,
        "perform_time": tx.perform_time,
        "state": tx.state.code(),
    })
}

fn cancel_result(tx: &PaymentTransaction) -> Value {
    json!({
        "transaction": tx.id,
        "cancel_time": tx.cancel_time,
        "state": tx.state.code(),
    })
}

fn check_result(tx: &PaymentTransaction) -> Value {
    json!({
        "create_time": tx.create_time,
        "perform_time": tx.perform_time,
        "cancel_time": tx.cancel_time,
        "transaction": tx.id,
        "state": tx.state.code(),
        "reason": tx.reason,
    })
}

fn statement_entry(tx: &PaymentTransaction) -> Value {
    json!({
        "id": tx.id,
        "time": tx.time,
        "amount": tx.amount,
        "account": tx.account,
        "create_time": tx.create_time,
        "perform_time": tx.perform_time,
        "cancel_time": tx.cancel_time,
        "transaction": tx.id,
        "state": tx.state.code(),
        "reason": tx.reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::order::StubOrderService;
    use crate::adapters::store::InMemoryTransactionStore;
    use crate::ports::Order;
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    const SECRET: &str = "payme-test-secret";

    fn auth_header() -> String {
        format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!("Paycom:{}", SECRET))
        )
    }

    fn gateway() -> PaymeGateway {
        gateway_with_store(Arc::new(InMemoryTransactionStore::new()))
    }

    fn gateway_with_store(store: Arc<dyn TransactionStore>) -> PaymeGateway {
        let orders = StubOrderService::new().with_order(Order {
            id: "o1".to_string(),
            amount: 500_000,
            payable: true,
        });
        PaymeGateway::new(
            store,
            Arc::new(orders),
            PaymeConfig {
                merchant_id: "m1".to_string(),
                secret_key: SECRET.to_string(),
            },
        )
    }

    fn request(method: &str, params: Value) -> RpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        }))
        .unwrap()
    }

    async fn call(gateway: &PaymeGateway, method: &str, params: Value) -> RpcResponse {
        let header = auth_header();
        gateway.handle(Some(&header), request(method, params)).await
    }

    fn create_params() -> Value {
        json!({
            "id": "t1",
            "time": 1000,
            "amount": 500_000,
            "account": {"order_id": "o1"},
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Authentication
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_auth_yields_rpc_error_not_transport_error() {
        let gateway = gateway();
        let resp = gateway
            .handle(None, request("CheckTransaction", json!({"id": "t1"})))
            .await;
        assert_eq!(resp.error.unwrap().code, -32504);
        assert!(resp.result.is_none());
        assert_eq!(resp.id, json!(1));
    }

    #[tokio::test]
    async fn wrong_secret_rejected_before_dispatch() {
        let gateway = gateway();
        let header = format!(
            "Basic {}",
            general_purpose::STANDARD.encode("Paycom:wrong-secret")
        );
        let resp = gateway
            .handle(Some(&header), request("CreateTransaction", create_params()))
            .await;
        assert_eq!(resp.error.unwrap().code, -32504);

        // Nothing was stored.
        let check = call(&gateway, "CheckTransaction", json!({"id": "t1"})).await;
        assert_eq!(check.error.unwrap().code, -31003);
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatch
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let gateway = gateway();
        let resp = call(&gateway, "GetBalance", json!({})).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn malformed_params_yield_invalid_params() {
        let gateway = gateway();
        let resp = call(&gateway, "PerformTransaction", json!({"no_id": true})).await;
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    // ══════════════════════════════════════════════════════════════
    // CheckPerformTransaction
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn check_perform_allows_valid_order() {
        let gateway = gateway();
        let resp = call(
            &gateway,
            "CheckPerformTransaction",
            json!({"amount": 500_000, "account": {"order_id": "o1"}}),
        )
        .await;
        assert_eq!(resp.result.unwrap()["allow"], true);
    }

    #[tokio::test]
    async fn check_perform_missing_account_yields_invalid_account() {
        let gateway = gateway();
        let resp = call(
            &gateway,
            "CheckPerformTransaction",
            json!({"amount": 500_000, "account": {}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, -31050);
    }

    #[tokio::test]
    async fn check_perform_unknown_order_yields_invalid_account() {
        let gateway = gateway();
        let resp = call(
            &gateway,
            "CheckPerformTransaction",
            json!({"amount": 500_000, "account": {"order_id": "missing"}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, -31050);
    }

    #[tokio::test]
    async fn check_perform_wrong_amount_yields_invalid_amount() {
        let gateway = gateway();
        let resp = call(
            &gateway,
            "CheckPerformTransaction",
            json!({"amount": 999, "account": {"order_id": "o1"}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, -31001);
    }

    // ══════════════════════════════════════════════════════════════
    // CreateTransaction
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_stores_created_transaction() {
        let gateway = gateway();
        let resp = call(&gateway, "CreateTransaction", create_params()).await;
        let result = resp.result.unwrap();
        assert_eq!(result["transaction"], "t1");
        assert_eq!(result["state"], 1);
        assert!(result["create_time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn create_is_idempotent_for_created_transaction() {
        let gateway = gateway();
        let first = call(&gateway, "CreateTransaction", create_params()).await;
        let second = call(&gateway, "CreateTransaction", create_params()).await;
        assert_eq!(first.result.unwrap(), second.result.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_retry_after_completion() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;
        call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;

        let resp = call(&gateway, "CreateTransaction", create_params()).await;
        assert_eq!(resp.error.unwrap().code, -31008);
    }

    // ══════════════════════════════════════════════════════════════
    // PerformTransaction
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn perform_completes_created_transaction() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;

        let resp = call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["state"], 2);
        assert!(result["perform_time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn perform_is_idempotent_without_restamping() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;

        let first = call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;
        let second = call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;
        assert_eq!(first.result.unwrap(), second.result.unwrap());
    }

    #[tokio::test]
    async fn perform_unknown_transaction_yields_not_found() {
        let gateway = gateway();
        let resp = call(&gateway, "PerformTransaction", json!({"id": "nope"})).await;
        assert_eq!(resp.error.unwrap().code, -31003);
    }

    #[tokio::test]
    async fn perform_cancelled_transaction_yields_unable_to_perform() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;
        call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 3}),
        )
        .await;

        let resp = call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;
        assert_eq!(resp.error.unwrap().code, -31008);
    }

    // ══════════════════════════════════════════════════════════════
    // CancelTransaction
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancel_created_yields_cancelled_state() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;

        let resp = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 3}),
        )
        .await;
        let result = resp.result.unwrap();
        assert_eq!(result["state"], -1);
        assert!(result["cancel_time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn cancel_completed_yields_cancelled_after_complete() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;
        call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;

        let resp = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 5}),
        )
        .await;
        assert_eq!(resp.result.unwrap()["state"], -2);

        let check = call(&gateway, "CheckTransaction", json!({"id": "t1"})).await;
        let result = check.result.unwrap();
        assert_eq!(result["reason"], 5);
        assert!(result["perform_time"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_when_already_cancelled() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;
        let first = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 3}),
        )
        .await;
        let second = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 4}),
        )
        .await;
        // Retry returns the stored cancellation, original reason kept.
        assert_eq!(first.result.unwrap(), second.result.unwrap());
    }

    #[tokio::test]
    async fn cancel_unknown_transaction_yields_not_found() {
        let gateway = gateway();
        let resp = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "nope", "reason": 1}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, -31003);
    }

    // ══════════════════════════════════════════════════════════════
    // CheckTransaction / GetStatement
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn check_returns_full_lifecycle_envelope() {
        let gateway = gateway();
        call(&gateway, "CreateTransaction", create_params()).await;

        let resp = call(&gateway, "CheckTransaction", json!({"id": "t1"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["transaction"], "t1");
        assert_eq!(result["state"], 1);
        assert_eq!(result["perform_time"], 0);
        assert_eq!(result["cancel_time"], 0);
        assert!(result["reason"].is_null());
    }

    #[tokio::test]
    async fn statement_filters_by_create_time_inclusive() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let gateway = gateway_with_store(store.clone());

        for (id, create_time) in [("a", 100), ("b", 200), ("c", 300), ("d", 301)] {
            let mut tx = PaymentTransaction::create(
                id,
                0,
                500_000,
                serde_json::Map::new(),
            );
            tx.create_time = create_time;
            store.insert(&tx).await.unwrap();
        }

        let resp = call(&gateway, "GetStatement", json!({"from": 200, "to": 300})).await;
        let result = resp.result.unwrap();
        let ids: Vec<&str> = result["transactions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    // ══════════════════════════════════════════════════════════════
    // Full lifecycle
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_perform_cancel_lifecycle() {
        let gateway = gateway();

        let create = call(&gateway, "CreateTransaction", create_params()).await;
        assert_eq!(create.result.unwrap()["state"], 1);

        let perform = call(&gateway, "PerformTransaction", json!({"id": "t1"})).await;
        let perform = perform.result.unwrap();
        assert_eq!(perform["state"], 2);
        assert!(perform["perform_time"].as_i64().unwrap() > 0);

        let cancel = call(
            &gateway,
            "CancelTransaction",
            json!({"id": "t1", "reason": 5}),
        )
        .await;
        assert_eq!(cancel.result.unwrap()["state"], -2);
    }
}
