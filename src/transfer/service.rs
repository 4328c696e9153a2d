use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{Account, AsyncTransaction, Transaction, TxStatus};
use crate::error::TransferError;
use crate::ports::{AccountRepository, AsyncTransactionRepository, LockManager, Message, MessageProducer, UnitOfWork};
use crate::transfer::messages::{DlqMessage, TransferMessage};

/// Both accounts are held for at most this long before the lock
/// acquisition attempt gives up (spec §5).
const LOCK_TTL: Duration = Duration::from_secs(10);

/// Matches the original's `MaxRetries = 3`: a message is retried up to
/// three times after its first delivery (four attempts total) before it
/// is dead-lettered.
pub const MAX_RETRIES: u32 = 3;

pub const TOPIC_TRANSACTIONS: &str = "transactions";
pub const TOPIC_TRANSACTIONS_DLQ: &str = "transactions-dlq";

/// The core transfer primitive (C5), its async submit/status surface
/// (C6/C9), and the retry/dead-letter classification the async
/// processor applies (C7).
pub struct TransferService {
    accounts: Arc<dyn AccountRepository>,
    async_transactions: Arc<dyn AsyncTransactionRepository>,
    uow: Arc<dyn UnitOfWork>,
    locks: Arc<dyn LockManager>,
    producer: Arc<dyn MessageProducer>,
}

impl TransferService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        async_transactions: Arc<dyn AsyncTransactionRepository>,
        uow: Arc<dyn UnitOfWork>,
        locks: Arc<dyn LockManager>,
        producer: Arc<dyn MessageProducer>,
    ) -> Self {
        Self {
            accounts,
            async_transactions,
            uow,
            locks,
            producer,
        }
    }

    pub async fn create_account(
        &self,
        account_id: i64,
        initial_balance: i64,
    ) -> Result<Account, TransferError> {
        if initial_balance < 0 {
            return Err(TransferError::InvalidAmount);
        }
        self.accounts.create(account_id, initial_balance).await
    }

    pub async fn get_account(&self, account_id: i64) -> Result<Account, TransferError> {
        self.accounts.get_by_id(account_id).await
    }

    /// Executes a transfer immediately: validates, locks both accounts
    /// in sorted order, then debits, credits, and records the ledger
    /// entry inside one database transaction (spec §4.5).
    pub async fn transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransferError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }
        if from == to {
            return Err(TransferError::SameAccount);
        }

        let guard = self
            .locks
            .lock_accounts(&[from, to], LOCK_TTL, cancel)
            .await?;
        let result = self.execute_transfer(from, to, amount, cancel).await;

        if let Err(e) = guard.unlock().await {
            tracing::error!(error = %e, "failed to release transfer locks");
        }

        result
    }

    async fn execute_transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransferError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.uow
            .execute(
                Box::new(move |ctx| {
                    Box::pin(async move {
                        let mut source = ctx.lock_account_for_update(from).await?;
                        let mut destination = ctx.lock_account_for_update(to).await?;

                        source.debit(amount)?;
                        destination.credit(amount)?;

                        ctx.update_account(&source).await?;
                        ctx.update_account(&destination).await?;

                        let txn = Transaction::new(id, from, to, amount, now);
                        ctx.insert_transaction(&txn).await?;
                        Ok(txn)
                    })
                }),
                cancel,
            )
            .await
    }

    /// Records a pending `AsyncTransaction` and enqueues the transfer
    /// for the consumer pipeline (spec §4.6). If publishing fails the
    /// record is immediately marked failed rather than left pending
    /// forever.
    pub async fn submit_transfer(
        &self,
        from: i64,
        to: i64,
        amount: i64,
    ) -> Result<Uuid, TransferError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }
        if from == to {
            return Err(TransferError::SameAccount);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let record = AsyncTransaction::new_pending(id, from, to, amount, now);
        self.async_transactions.create(&record).await?;

        let msg = TransferMessage {
            id,
            from,
            to,
            amount,
            retry: 0,
        };

        match serde_json::to_vec(&msg) {
            Ok(payload) => {
                let publish = self
                    .producer
                    .publish(
                        TOPIC_TRANSACTIONS,
                        Message {
                            key: id.to_string().into_bytes(),
                            value: payload,
                        },
                    )
                    .await;
                if let Err(e) = publish {
                    tracing::error!(error = %e, transfer_id = %id, "failed to queue transfer");
                    self.async_transactions
                        .update_status(id, TxStatus::Failed, Some("failed to queue".into()), Utc::now())
                        .await?;
                    return Err(e);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, transfer_id = %id, "failed to marshal transfer message");
                self.async_transactions
                    .update_status(id, TxStatus::Failed, Some("failed to queue".into()), Utc::now())
                    .await?;
                return Err(TransferError::Internal(e.to_string()));
            }
        }

        Ok(id)
    }

    pub async fn get_status(&self, id: Uuid) -> Result<AsyncTransaction, TransferError> {
        self.async_transactions.get_by_id(id).await
    }

    /// The outcome of processing one queued message, telling the
    /// consumer wiring whether to ack, requeue, or dead-letter.
    pub async fn process_transfer(
        &self,
        msg: TransferMessage,
        cancel: &CancellationToken,
    ) -> ProcessOutcome {
        let now = Utc::now();
        match self.transfer(msg.from, msg.to, msg.amount, cancel).await {
            Ok(_) => {
                if let Err(e) = self
                    .async_transactions
                    .update_status(msg.id, TxStatus::Completed, None, now)
                    .await
                {
                    tracing::error!(error = %e, transfer_id = %msg.id, "failed to record completed status");
                }
                ProcessOutcome::Completed
            }
            Err(e) if e.is_business() => {
                tracing::warn!(error = %e, transfer_id = %msg.id, "transfer rejected, not retrying");
                if let Err(update_err) = self
                    .async_transactions
                    .update_status(msg.id, TxStatus::Failed, Some(e.to_string()), now)
                    .await
                {
                    tracing::error!(error = %update_err, transfer_id = %msg.id, "failed to record failed status");
                }
                ProcessOutcome::FailedTerminal
            }
            Err(e) => {
                if msg.retry >= MAX_RETRIES {
                    tracing::error!(error = %e, transfer_id = %msg.id, "max retries exceeded, dead-lettering");
                    if let Err(update_err) = self
                        .async_transactions
                        .update_status(msg.id, TxStatus::Failed, Some("max retries exceeded".into()), now)
                        .await
                    {
                        tracing::error!(error = %update_err, transfer_id = %msg.id, "failed to record failed status");
                    }
                    ProcessOutcome::DeadLetter {
                        reason: e.to_string(),
                    }
                } else {
                    tracing::warn!(error = %e, transfer_id = %msg.id, retry = msg.retry, "transient failure, requeuing");
                    ProcessOutcome::Requeue
                }
            }
        }
    }

    /// Dead-letters a message that could not even be decoded into a
    /// `TransferMessage` (malformed JSON or an invalid account/amount
    /// shape) — the Rust analogue of the original's "invalid message id"
    /// branch, broadened because `serde` rejects the whole payload
    /// rather than only a bad id field.
    pub async fn publish_malformed_to_dlq(
        &self,
        key: Vec<u8>,
        original_payload: Vec<u8>,
        reason: String,
    ) -> Result<(), TransferError> {
        let envelope = serde_json::json!({
            "reason": reason,
            "raw": String::from_utf8_lossy(&original_payload),
        });
        let payload =
            serde_json::to_vec(&envelope).map_err(|e| TransferError::Internal(e.to_string()))?;
        self.producer
            .publish(TOPIC_TRANSACTIONS_DLQ, Message { key, value: payload })
            .await
    }

    pub async fn publish_to_dlq(&self, msg: &TransferMessage, reason: String) -> Result<(), TransferError> {
        let dlq = DlqMessage {
            original: msg.clone(),
            reason,
        };
        let payload = serde_json::to_vec(&dlq).map_err(|e| TransferError::Internal(e.to_string()))?;
        self.producer
            .publish(
                TOPIC_TRANSACTIONS_DLQ,
                Message {
                    key: msg.id.to_string().into_bytes(),
                    value: payload,
                },
            )
            .await
    }

    pub async fn requeue(&self, mut msg: TransferMessage) -> Result<(), TransferError> {
        msg.retry += 1;
        let payload = serde_json::to_vec(&msg).map_err(|e| TransferError::Internal(e.to_string()))?;
        self.producer
            .publish(
                TOPIC_TRANSACTIONS,
                Message {
                    key: msg.id.to_string().into_bytes(),
                    value: payload,
                },
            )
            .await
    }
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Completed,
    FailedTerminal,
    Requeue,
    DeadLetter { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::ports::{LockGuard, TransactionContext};

    /// Balances and ledger shared between the mock repository and the
    /// mock unit-of-work, mirroring how the real `PgAccountRepository`
    /// and `PgUnitOfWork` both read/write the same `accounts` table.
    #[derive(Default)]
    struct SharedState {
        accounts: Mutex<HashMap<i64, Account>>,
        ledger: Mutex<Vec<Transaction>>,
    }

    struct MockAccountRepository {
        state: Arc<SharedState>,
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn create(&self, account_id: i64, initial_balance: i64) -> Result<Account, TransferError> {
            let mut accounts = self.state.accounts.lock().unwrap();
            if accounts.contains_key(&account_id) {
                return Err(TransferError::AccountAlreadyExists);
            }
            let account = Account::new(account_id, initial_balance);
            accounts.insert(account_id, account.clone());
            Ok(account)
        }

        async fn get_by_id(&self, account_id: i64) -> Result<Account, TransferError> {
            self.state
                .accounts
                .lock()
                .unwrap()
                .get(&account_id)
                .cloned()
                .ok_or(TransferError::AccountNotFound)
        }
    }

    #[derive(Default)]
    struct MockAsyncTransactionRepository {
        records: Mutex<HashMap<Uuid, AsyncTransaction>>,
    }

    #[async_trait]
    impl AsyncTransactionRepository for MockAsyncTransactionRepository {
        async fn create(&self, txn: &AsyncTransaction) -> Result<(), TransferError> {
            self.records.lock().unwrap().insert(txn.id, txn.clone());
            Ok(())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<AsyncTransaction, TransferError> {
            self.records
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(TransferError::TransactionNotFound)
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: TxStatus,
            error: Option<String>,
            now: chrono::DateTime<Utc>,
        ) -> Result<(), TransferError> {
            let mut records = self.records.lock().unwrap();
            let record = records.get_mut(&id).ok_or(TransferError::TransactionNotFound)?;
            record.status = status;
            record.error = error;
            record.updated_at = now;
            Ok(())
        }
    }

    struct MockTransactionContext {
        state: Arc<SharedState>,
    }

    #[async_trait]
    impl TransactionContext for MockTransactionContext {
        async fn lock_account_for_update(&mut self, account_id: i64) -> Result<Account, TransferError> {
            self.state
                .accounts
                .lock()
                .unwrap()
                .get(&account_id)
                .cloned()
                .ok_or(TransferError::AccountNotFound)
        }

        async fn update_account(&mut self, account: &Account) -> Result<(), TransferError> {
            self.state
                .accounts
                .lock()
                .unwrap()
                .insert(account.account_id, account.clone());
            Ok(())
        }

        async fn insert_transaction(&mut self, txn: &Transaction) -> Result<(), TransferError> {
            self.state.ledger.lock().unwrap().push(txn.clone());
            Ok(())
        }
    }

    struct MockUnitOfWork {
        state: Arc<SharedState>,
    }

    #[async_trait]
    impl UnitOfWork for MockUnitOfWork {
        async fn execute<'a>(
            &'a self,
            work: Box<
                dyn for<'c> FnOnce(&'c mut dyn TransactionContext) -> BoxFuture<'c, Result<Transaction, TransferError>>
                    + Send
                    + 'a,
            >,
            cancel: &CancellationToken,
        ) -> Result<Transaction, TransferError> {
            let mut ctx = MockTransactionContext {
                state: self.state.clone(),
            };
            tokio::select! {
                result = work(&mut ctx) => result,
                _ = cancel.cancelled() => Err(TransferError::Cancelled),
            }
        }
    }

    struct NoopLockGuard;

    #[async_trait]
    impl LockGuard for NoopLockGuard {
        async fn unlock(self: Box<Self>) -> Result<(), TransferError> {
            Ok(())
        }
    }

    /// Always grants locks immediately — used for every test that isn't
    /// specifically exercising lock failure.
    struct MockLockManager;

    #[async_trait]
    impl LockManager for MockLockManager {
        async fn lock_accounts(
            &self,
            _account_ids: &[i64],
            _ttl: Duration,
            _cancel: &CancellationToken,
        ) -> Result<Box<dyn LockGuard>, TransferError> {
            Ok(Box::new(NoopLockGuard))
        }
    }

    /// Always fails lock acquisition with a transient error, so
    /// `process_transfer` takes the retry/dead-letter path.
    struct FailingLockManager;

    #[async_trait]
    impl LockManager for FailingLockManager {
        async fn lock_accounts(
            &self,
            _account_ids: &[i64],
            _ttl: Duration,
            _cancel: &CancellationToken,
        ) -> Result<Box<dyn LockGuard>, TransferError> {
            Err(TransferError::LockAcquisitionFailed)
        }
    }

    #[derive(Default)]
    struct MockProducer {
        published: Mutex<Vec<(String, Message)>>,
    }

    #[async_trait]
    impl MessageProducer for MockProducer {
        async fn publish(&self, topic: &str, message: Message) -> Result<(), TransferError> {
            self.published.lock().unwrap().push((topic.to_string(), message));
            Ok(())
        }
    }

    struct Harness {
        service: TransferService,
        state: Arc<SharedState>,
        async_transactions: Arc<MockAsyncTransactionRepository>,
        producer: Arc<MockProducer>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_lock_manager(Arc::new(MockLockManager))
        }

        fn with_lock_manager(locks: Arc<dyn LockManager>) -> Self {
            let state = Arc::new(SharedState::default());
            let accounts = Arc::new(MockAccountRepository { state: state.clone() });
            let async_transactions = Arc::new(MockAsyncTransactionRepository::default());
            let uow = Arc::new(MockUnitOfWork { state: state.clone() });
            let producer = Arc::new(MockProducer::default());

            let service = TransferService::new(
                accounts,
                async_transactions.clone(),
                uow,
                locks,
                producer.clone(),
            );

            Self {
                service,
                state,
                async_transactions,
                producer,
            }
        }

        fn seed_account(&self, account_id: i64, balance: i64) {
            self.state
                .accounts
                .lock()
                .unwrap()
                .insert(account_id, Account::new(account_id, balance));
        }

        fn balance(&self, account_id: i64) -> i64 {
            self.state.accounts.lock().unwrap().get(&account_id).unwrap().balance
        }
    }

    #[tokio::test]
    async fn transfer_happy_path_moves_balance_and_records_ledger() {
        let h = Harness::new();
        h.seed_account(1, 1_000);
        h.seed_account(2, 500);

        let cancel = CancellationToken::new();
        let txn = h.service.transfer(1, 2, 300, &cancel).await.unwrap();

        assert_eq!(txn.source_account_id, 1);
        assert_eq!(txn.destination_account_id, 2);
        assert_eq!(txn.amount, 300);
        assert_eq!(h.balance(1), 700);
        assert_eq!(h.balance(2), 800);
        assert_eq!(h.state.ledger.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transfer_insufficient_balance_leaves_balances_untouched() {
        let h = Harness::new();
        h.seed_account(1, 100);
        h.seed_account(2, 500);

        let cancel = CancellationToken::new();
        let err = h.service.transfer(1, 2, 1_000, &cancel).await.unwrap_err();

        assert!(matches!(err, TransferError::InsufficientBalance));
        assert_eq!(h.balance(1), 100);
        assert_eq!(h.balance(2), 500);
        assert!(h.state.ledger.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transfer_rejects_same_account_before_locking() {
        let h = Harness::new();
        h.seed_account(1, 100);

        let cancel = CancellationToken::new();
        let err = h.service.transfer(1, 1, 50, &cancel).await.unwrap_err();
        assert!(matches!(err, TransferError::SameAccount));
    }

    #[tokio::test]
    async fn submit_transfer_records_pending_and_publishes_to_transactions_topic() {
        let h = Harness::new();
        h.seed_account(1, 1_000);
        h.seed_account(2, 0);

        let id = h.service.submit_transfer(1, 2, 250).await.unwrap();

        let record = h.async_transactions.get_by_id(id).await.unwrap();
        assert_eq!(record.status, TxStatus::Pending);
        assert_eq!(record.from_account, 1);
        assert_eq!(record.to_account, 2);
        assert_eq!(record.amount, 250);

        let published = h.producer.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, TOPIC_TRANSACTIONS);
    }

    #[tokio::test]
    async fn process_transfer_business_failure_marks_failed_without_retry() {
        let h = Harness::new();
        h.seed_account(1, 10);
        h.seed_account(2, 0);

        let id = h.service.submit_transfer(1, 2, 1_000).await.unwrap();
        let msg = TransferMessage { id, from: 1, to: 2, amount: 1_000, retry: 0 };

        let cancel = CancellationToken::new();
        let outcome = h.service.process_transfer(msg, &cancel).await;

        assert!(matches!(outcome, ProcessOutcome::FailedTerminal));
        let record = h.async_transactions.get_by_id(id).await.unwrap();
        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(h.balance(1), 10, "rejected transfer must not touch balances");
    }

    #[tokio::test]
    async fn process_transfer_requeues_transient_failures_below_max_retries() {
        let h = Harness::with_lock_manager(Arc::new(FailingLockManager));
        h.seed_account(1, 1_000);
        h.seed_account(2, 0);

        let id = h.service.submit_transfer(1, 2, 100).await.unwrap();
        let cancel = CancellationToken::new();

        for retry in 0..MAX_RETRIES {
            let msg = TransferMessage { id, from: 1, to: 2, amount: 100, retry };
            let outcome = h.service.process_transfer(msg, &cancel).await;
            assert!(
                matches!(outcome, ProcessOutcome::Requeue),
                "retry {retry} should requeue, got {outcome:?}"
            );
        }
    }

    #[tokio::test]
    async fn process_transfer_dead_letters_once_retries_are_exhausted() {
        let h = Harness::with_lock_manager(Arc::new(FailingLockManager));
        h.seed_account(1, 1_000);
        h.seed_account(2, 0);

        let id = h.service.submit_transfer(1, 2, 100).await.unwrap();
        let msg = TransferMessage { id, from: 1, to: 2, amount: 100, retry: MAX_RETRIES };
        let cancel = CancellationToken::new();

        let outcome = h.service.process_transfer(msg, &cancel).await;

        assert!(matches!(outcome, ProcessOutcome::DeadLetter { .. }));
        let record = h.async_transactions.get_by_id(id).await.unwrap();
        assert_eq!(record.status, TxStatus::Failed);
    }
}
