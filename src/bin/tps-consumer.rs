//! Pulls queued transfer messages, executes the same transfer
//! primitive as the server, and classifies failures into business
//! (terminal) vs transient (retried, then dead-lettered).

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tps::broker;
use tps::db::{Database, PgAccountRepository, PgAsyncTransactionRepository, PgUnitOfWork};
use tps::lock::PgLockManager;
use tps::transfer::{TransferService, consumer};
use tps::{config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load();
    telemetry::init(&cfg.log);

    // Migrations are only run by the server process (spec §11).
    let db = Database::connect(&cfg.postgres).await?;

    let pool = db.pool().clone();
    let accounts = Arc::new(PgAccountRepository::new(pool.clone()));
    let async_transactions = Arc::new(PgAsyncTransactionRepository::new(pool.clone()));
    let uow = Arc::new(PgUnitOfWork::new(pool.clone()));
    let locks = Arc::new(PgLockManager::new(pool.clone()));

    let broker_client = broker::connect(&cfg.broker.bootstrap_brokers).await?;
    let producer = Arc::new(broker::KafkaProducer::new(broker_client.clone()));
    let message_consumer = Arc::new(broker::KafkaConsumer::new(broker_client, pool.clone()));

    let service = Arc::new(TransferService::new(
        accounts,
        async_transactions,
        uow,
        locks,
        producer,
    ));

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    tracing::info!("tps-consumer starting");
    consumer::run(service, message_consumer, shutdown).await?;

    Ok(())
}
