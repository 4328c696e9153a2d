//! Postgres advisory-lock based cross-account lock manager.
//!
//! Grounded in the original `internal/infrastructure/lock.go`: session-level
//! `pg_try_advisory_lock`/`pg_advisory_unlock`, polled with exponential
//! backoff (5ms doubling up to a 50ms cap) until a TTL deadline, with
//! accounts locked in ascending id order so no two callers can ever
//! acquire the same pair in opposite order.
//!
//! Advisory locks are tied to the *session* (the physical connection)
//! that took them, not to a transaction. A pool normally hands back
//! connections after each checked-out use, so holding a session-scoped
//! lock across an `acquire`...`release` span requires pinning one
//! connection for that span. [`PgLockManager`] does this by keeping the
//! acquiring connection checked out of the pool until release (see the
//! Open Question in DESIGN.md on this tradeoff).

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TransferError;
use crate::ports::{LockGuard, LockManager};

const INITIAL_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(50);

pub struct PgLockManager {
    pool: PgPool,
}

impl PgLockManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps an account id directly to its advisory lock key. Using the
    /// numeric id itself (rather than hashing a string key, as the
    /// original does) avoids any collision risk entirely — see
    /// DESIGN.md's resolution of the weak-hash Open Question.
    fn lock_key(account_id: i64) -> i64 {
        account_id
    }

    async fn try_lock_one(
        conn: &mut PoolConnection<Postgres>,
        key: i64,
    ) -> Result<bool, TransferError> {
        let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(&mut **conn)
            .await?;
        Ok(acquired)
    }

    async fn unlock_one(conn: &mut PoolConnection<Postgres>, key: i64) -> Result<(), TransferError> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(key)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LockManager for PgLockManager {
    async fn lock_accounts(
        &self,
        account_ids: &[i64],
        ttl: Duration,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn LockGuard>, TransferError> {
        let mut ids: Vec<i64> = account_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(TransferError::from)?;

        let mut acquired_keys = Vec::with_capacity(ids.len());
        let deadline = Instant::now() + ttl;

        for id in &ids {
            let key = Self::lock_key(*id);
            let mut backoff = INITIAL_BACKOFF;
            loop {
                if cancel.is_cancelled() {
                    tracing::warn!(account_id = id, "advisory lock acquisition cancelled");
                    for acquired in acquired_keys.into_iter().rev() {
                        if let Err(e) = Self::unlock_one(&mut conn, acquired).await {
                            tracing::error!(error = %e, "failed to release partially acquired lock");
                        }
                    }
                    return Err(TransferError::Cancelled);
                }
                if Self::try_lock_one(&mut conn, key).await? {
                    acquired_keys.push(key);
                    tracing::debug!(account_id = id, "acquired advisory lock");
                    break;
                }
                if Instant::now() >= deadline {
                    tracing::warn!(account_id = id, "advisory lock acquisition timed out");
                    for acquired in acquired_keys.into_iter().rev() {
                        if let Err(e) = Self::unlock_one(&mut conn, acquired).await {
                            tracing::error!(error = %e, "failed to release partially acquired lock");
                        }
                    }
                    return Err(TransferError::LockAcquisitionFailed);
                }
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => {
                        tracing::warn!(account_id = id, "advisory lock acquisition cancelled");
                        for acquired in acquired_keys.into_iter().rev() {
                            if let Err(e) = Self::unlock_one(&mut conn, acquired).await {
                                tracing::error!(error = %e, "failed to release partially acquired lock");
                            }
                        }
                        return Err(TransferError::Cancelled);
                    }
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }

        Ok(Box::new(PgLockGuard {
            conn: Some(conn),
            keys: acquired_keys,
        }))
    }
}

struct PgLockGuard {
    conn: Option<PoolConnection<Postgres>>,
    keys: Vec<i64>,
}

#[async_trait]
impl LockGuard for PgLockGuard {
    async fn unlock(mut self: Box<Self>) -> Result<(), TransferError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let mut first_err = None;
        for key in self.keys.drain(..) {
            if let Err(e) = PgLockManager::unlock_one(&mut conn, key).await {
                tracing::error!(error = %e, key, "failed to release advisory lock");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_identity() {
        assert_eq!(PgLockManager::lock_key(42), 42);
    }

    #[test]
    fn account_ids_sort_and_dedup_before_locking() {
        let mut ids = vec![5i64, 1, 3, 1];
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
