use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio_util::sync::CancellationToken;

use crate::domain::{Account, Transaction as LedgerTransaction};
use crate::error::TransferError;
use crate::ports::{TransactionContext, UnitOfWork};

pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PgTransactionContext {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionContext for PgTransactionContext {
    async fn lock_account_for_update(&mut self, account_id: i64) -> Result<Account, TransferError> {
        let row = sqlx::query(
            "SELECT account_id, balance FROM accounts WHERE account_id = $1 FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(TransferError::AccountNotFound)?;

        Ok(Account::new(row.get("account_id"), row.get("balance")))
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), TransferError> {
        sqlx::query("UPDATE accounts SET balance = $1 WHERE account_id = $2")
            .bind(account.balance)
            .bind(account.account_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_transaction(&mut self, txn: &LedgerTransaction) -> Result<(), TransferError> {
        sqlx::query(
            "INSERT INTO transactions
                (id, source_account_id, destination_account_id, amount, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(txn.id)
        .bind(txn.source_account_id)
        .bind(txn.destination_account_id)
        .bind(txn.amount)
        .bind(txn.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn execute<'a>(
        &'a self,
        work: Box<
            dyn for<'c> FnOnce(&'c mut dyn TransactionContext) -> BoxFuture<'c, Result<LedgerTransaction, TransferError>>
                + Send
                + 'a,
        >,
        cancel: &CancellationToken,
    ) -> Result<LedgerTransaction, TransferError> {
        let tx = self.pool.begin().await.map_err(TransferError::from)?;
        let mut ctx = PgTransactionContext { tx };

        let result = tokio::select! {
            result = work(&mut ctx) => result,
            _ = cancel.cancelled() => Err(TransferError::Cancelled),
        };

        let PgTransactionContext { tx } = ctx;
        match result {
            Ok(txn) => {
                tx.commit().await.map_err(TransferError::from)?;
                Ok(txn)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}
