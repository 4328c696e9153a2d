use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::Row;

use crate::domain::Account;
use crate::error::TransferError;
use crate::ports::AccountRepository;

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(
        &self,
        account_id: i64,
        initial_balance: i64,
    ) -> Result<Account, TransferError> {
        let result = sqlx::query(
            "INSERT INTO accounts (account_id, balance) VALUES ($1, $2)
             ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(account_id)
        .bind(initial_balance)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TransferError::AccountAlreadyExists);
        }

        Ok(Account::new(account_id, initial_balance))
    }

    async fn get_by_id(&self, account_id: i64) -> Result<Account, TransferError> {
        let row = sqlx::query("SELECT account_id, balance FROM accounts WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TransferError::AccountNotFound)?;

        Ok(Account::new(row.get("account_id"), row.get("balance")))
    }
}
