//! Postgres transaction store.
//!
//! Durable `TransactionStore` adapter. The table is keyed by the provider
//! transaction id; uniqueness comes from the primary key, and state
//! transitions are compare-and-set (`UPDATE .. WHERE id = $1 AND state = $2`)
//! so concurrent webhook retries cannot race a read-modify-write.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::transaction::{PaymentTransaction, TransactionState};
use crate::ports::{StoreError, TransactionStore};

/// Durable `TransactionStore` backed by the `payment_transactions` table.
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row shape for `payment_transactions`.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    time: i64,
    amount: i64,
    account: serde_json::Value,
    state: String,
    create_time: i64,
    perform_time: i64,
    cancel_time: i64,
    reason: Option<i32>,
}

impl TryFrom<TransactionRow> for PaymentTransaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let account = match row.account {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(StoreError::Database(format!(
                    "Transaction {} has non-object account: {}",
                    row.id, other
                )))
            }
        };
        let state = parse_state(&row.state)
            .ok_or_else(|| StoreError::Database(format!("Unknown state: {}", row.state)))?;

        Ok(PaymentTransaction {
            id: row.id,
            time: row.time,
            amount: row.amount,
            account,
            state,
            create_time: row.create_time,
            perform_time: row.perform_time,
            cancel_time: row.cancel_time,
            reason: row.reason,
        })
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn insert(&self, tx: &PaymentTransaction) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_transactions
                (id, time, amount, account, state,
                 create_time, perform_time, cancel_time, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.time)
        .bind(tx.amount)
        .bind(serde_json::Value::Object(tx.account.clone()))
        .bind(state_to_string(tx.state))
        .bind(tx.create_time)
        .bind(tx.perform_time)
        .bind(tx.cancel_time)
        .bind(tx.reason)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateId(tx.id.clone()))
            }
            Err(err) => Err(StoreError::Database(err.to_string())),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentTransaction>, StoreError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, time, amount, account, state,
                   create_time, perform_time, cancel_time, reason
            FROM payment_transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StoreError::Database(err.to_string()))?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    async fn update_if_state(
        &self,
        tx: &PaymentTransaction,
        expected: TransactionState,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET state = $3, perform_time = $4, cancel_time = $5, reason = $6
            WHERE id = $1 AND state = $2
            "#,
        )
        .bind(&tx.id)
        .bind(state_to_string(expected))
        .bind(state_to_string(tx.state))
        .bind(tx.perform_time)
        .bind(tx.cancel_time)
        .bind(tx.reason)
        .execute(&self.pool)
        .await
        .map_err(|err| StoreError::Database(err.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::StaleState {
                id: tx.id.clone(),
                expected,
            });
        }
        Ok(())
    }

    async fn list_created_between(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<PaymentTransaction>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, time, amount, account, state,
                   create_time, perform_time, cancel_time, reason
            FROM payment_transactions
            WHERE create_time >= $1 AND create_time <= $2
            ORDER BY create_time
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StoreError::Database(err.to_string()))?;

        rows.into_iter()
            .map(PaymentTransaction::try_from)
            .collect()
    }
}

fn state_to_string(state: TransactionState) -> &'static str {
    match state {
        TransactionState::Created => "created",
        TransactionState::Completed => "completed",
        TransactionState::Cancelled => "cancelled",
        TransactionState::CancelledAfterComplete => "cancelled_after_complete",
    }
}

fn parse_state(value: &str) -> Option<TransactionState> {
    match value {
        "created" => Some(TransactionState::Created),
        "completed" => Some(TransactionState::Completed),
        "cancelled" => Some(TransactionState::Cancelled),
        "cancelled_after_complete" => Some(TransactionState::CancelledAfterComplete),
        _ => None,
    }
}
