use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::TransferError;

/// A held lock (or set of locks). Dropping this releases nothing by
/// itself — callers must call [`unlock`](LockGuard::unlock) explicitly
/// so release failures can be observed and logged, mirroring the
/// original's `unlock() error` return from `LockAccounts`.
#[async_trait]
pub trait LockGuard: Send {
    async fn unlock(self: Box<Self>) -> Result<(), TransferError>;
}

/// Cross-account mutual exclusion for the transfer primitive (spec §5).
/// Implementations must acquire multiple keys in one global order so
/// concurrent callers can never deadlock against each other.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquires locks for every id in `account_ids`, in ascending order,
    /// each held for at most `ttl`. On partial failure, already-acquired
    /// locks are released before returning `LockAcquisitionFailed`.
    /// Polling checks `cancel` on every iteration and backs off that
    /// iteration's sleep against it, returning `Cancelled` with every
    /// partial lock released (spec §4.3 step 4, §5).
    async fn lock_accounts(
        &self,
        account_ids: &[i64],
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn LockGuard>, TransferError>;
}
