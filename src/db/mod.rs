//! PostgreSQL persistence: connection pool, migrations, and the
//! repository/unit-of-work adapters behind the `ports` traits.

mod account_repo;
mod async_transaction_repo;
mod offset_store;
mod unit_of_work;

pub use account_repo::PgAccountRepository;
pub use async_transaction_repo::PgAsyncTransactionRepository;
pub use offset_store::PgOffsetStore;
pub use unit_of_work::PgUnitOfWork;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::PostgresConfig;

/// PostgreSQL connection pool, shared by every repository and the lock
/// manager.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &PostgresConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url())
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the embedded migrations. Only the API process calls this —
    /// the consumer assumes the schema already exists (spec §11).
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // These require a running PostgreSQL instance; see DESIGN.md for the
    // docker-compose snippet used to run them locally.

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: "postgres".into(),
            db_name: "tps_test".into(),
            sslmode: "disable".into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn connect_succeeds_against_local_postgres() {
        let db = Database::connect(&test_config()).await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn health_check_passes() {
        let db = Database::connect(&test_config())
            .await
            .expect("failed to connect");
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn migrations_are_idempotent() {
        let db = Database::connect(&test_config())
            .await
            .expect("failed to connect");
        db.run_migrations().await.expect("first run");
        db.run_migrations().await.expect("second run must be a no-op");
    }
}
