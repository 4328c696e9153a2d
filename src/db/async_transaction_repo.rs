use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::{AsyncTransaction, TxStatus};
use crate::error::TransferError;
use crate::ports::AsyncTransactionRepository;

pub struct PgAsyncTransactionRepository {
    pool: PgPool,
}

impl PgAsyncTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AsyncTransactionRepository for PgAsyncTransactionRepository {
    async fn create(&self, txn: &AsyncTransaction) -> Result<(), TransferError> {
        sqlx::query(
            "INSERT INTO async_transactions
                (id, from_account, to_account, amount, status, error, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(txn.id)
        .bind(txn.from_account)
        .bind(txn.to_account)
        .bind(txn.amount)
        .bind(txn.status.as_str())
        .bind(&txn.error)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<AsyncTransaction, TransferError> {
        let row = sqlx::query(
            "SELECT id, from_account, to_account, amount, status, error, created_at, updated_at
             FROM async_transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TransferError::TransactionNotFound)?;

        row_to_async_transaction(&row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: TxStatus,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransferError> {
        let result = sqlx::query(
            "UPDATE async_transactions SET status = $1, error = $2, updated_at = $3
             WHERE id = $4",
        )
        .bind(status.as_str())
        .bind(error)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TransferError::TransactionNotFound);
        }
        Ok(())
    }
}

fn row_to_async_transaction(row: &sqlx::postgres::PgRow) -> Result<AsyncTransaction, TransferError> {
    let status: String = row.get("status");
    let status: TxStatus = status
        .parse()
        .map_err(|e: String| TransferError::Internal(e))?;

    Ok(AsyncTransaction {
        id: row.get("id"),
        from_account: row.get("from_account"),
        to_account: row.get("to_account"),
        amount: row.get("amount"),
        status,
        error: row.get("error"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
