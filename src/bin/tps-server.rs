//! The sync HTTP surface: accepts transfers and either executes them
//! immediately or records them pending and enqueues a message.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use tps::api::{self, AppState};
use tps::broker;
use tps::db::{Database, PgAccountRepository, PgAsyncTransactionRepository, PgUnitOfWork};
use tps::lock::PgLockManager;
use tps::transfer::TransferService;
use tps::{config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load();
    telemetry::init(&cfg.log);

    let db = Database::connect(&cfg.postgres).await?;
    db.run_migrations().await?;

    let pool = db.pool().clone();
    let accounts = Arc::new(PgAccountRepository::new(pool.clone()));
    let async_transactions = Arc::new(PgAsyncTransactionRepository::new(pool.clone()));
    let uow = Arc::new(PgUnitOfWork::new(pool.clone()));
    let locks = Arc::new(PgLockManager::new(pool.clone()));

    let broker_client = broker::connect(&cfg.broker.bootstrap_brokers).await?;
    let producer = Arc::new(broker::KafkaProducer::new(broker_client));

    let service = Arc::new(TransferService::new(
        accounts,
        async_transactions,
        uow,
        locks,
        producer,
    ));

    let shutdown = CancellationToken::new();
    let state = AppState::new(service, Arc::new(db), shutdown.clone());
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", cfg.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "tps-server listening");

    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    Ok(())
}
