use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{Account, AsyncTransaction, Transaction, TxStatus};
use crate::error::TransferError;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `AccountAlreadyExists` if `account_id` is taken.
    async fn create(&self, account_id: i64, initial_balance: i64)
    -> Result<Account, TransferError>;

    /// Fails with `AccountNotFound` if no such account exists.
    async fn get_by_id(&self, account_id: i64) -> Result<Account, TransferError>;
}

#[async_trait]
pub trait AsyncTransactionRepository: Send + Sync {
    async fn create(&self, txn: &AsyncTransaction) -> Result<(), TransferError>;

    /// Fails with `TransactionNotFound` if no such id exists.
    async fn get_by_id(&self, id: Uuid) -> Result<AsyncTransaction, TransferError>;

    /// Moves a pending record to a terminal status. Callers only ever
    /// invoke this once per id (spec's monotonic status invariant); the
    /// repository does not itself enforce the transition, since the
    /// transfer pipeline is the sole writer.
    async fn update_status(
        &self,
        id: Uuid,
        status: TxStatus,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransferError>;
}

/// A single open database transaction, exposing exactly the operations
/// that must commit together: both balance updates and the ledger
/// insert (spec §4.5). Obtained only through [`UnitOfWork::execute`].
#[async_trait]
pub trait TransactionContext: Send {
    /// Locks the account row for the lifetime of the surrounding
    /// transaction (`SELECT ... FOR UPDATE`).
    async fn lock_account_for_update(&mut self, account_id: i64) -> Result<Account, TransferError>;

    async fn update_account(&mut self, account: &Account) -> Result<(), TransferError>;

    async fn insert_transaction(&mut self, txn: &Transaction) -> Result<(), TransferError>;
}

/// Runs a closure against one atomic database transaction, committing
/// on `Ok` and rolling back on `Err` or panic. Generalizes the
/// original's `TransactionManager.WithTransaction(ctx, func(tx) error)`
/// to Rust's lack of closures-over-interfaces: the callback receives a
/// `&mut dyn TransactionContext` instead of a rebound set of repositories.
///
/// `cancel` is raced against `work`: if it fires first, `work` is
/// dropped mid-flight and the transaction is rolled back, so a
/// cancelled transfer never has a partial effect (spec §4.3 step 4,
/// §5).
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn execute<'a>(
        &'a self,
        work: Box<
            dyn for<'c> FnOnce(&'c mut dyn TransactionContext) -> BoxFuture<'c, Result<Transaction, TransferError>>
                + Send
                + 'a,
        >,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransferError>;
}
