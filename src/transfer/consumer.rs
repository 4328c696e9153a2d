//! Subscribe-loop wiring for the `tps-consumer` binary: decode, process,
//! and ack/requeue/dead-letter each message (spec §4.7).

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::TransferError;
use crate::ports::{MessageConsumer, MessageHandle};
use crate::transfer::messages::TransferMessage;
use crate::transfer::service::{ProcessOutcome, TOPIC_TRANSACTIONS, TransferService};

pub const CONSUMER_GROUP: &str = "tps-consumer";

pub async fn run(
    service: Arc<TransferService>,
    consumer: Arc<dyn MessageConsumer>,
    shutdown: CancellationToken,
) -> Result<(), TransferError> {
    let cancel = shutdown.clone();
    let handler: Box<
        dyn Fn(Box<dyn MessageHandle>) -> BoxFuture<'static, Result<(), TransferError>> + Send + Sync,
    > = Box::new(move |handle: Box<dyn MessageHandle>| {
        let service = service.clone();
        let cancel = cancel.clone();
        Box::pin(async move { handle_one(&service, handle, &cancel).await })
    });

    consumer
        .subscribe(TOPIC_TRANSACTIONS, CONSUMER_GROUP, handler, shutdown)
        .await
}

async fn handle_one(
    service: &TransferService,
    handle: Box<dyn MessageHandle>,
    cancel: &CancellationToken,
) -> Result<(), TransferError> {
    let key = handle.message().key.clone();
    let payload = handle.message().value.clone();

    match serde_json::from_slice::<TransferMessage>(&payload) {
        Ok(msg) => match service.process_transfer(msg.clone(), cancel).await {
            ProcessOutcome::Completed | ProcessOutcome::FailedTerminal => handle.ack().await,
            ProcessOutcome::Requeue => {
                service.requeue(msg).await?;
                handle.ack().await
            }
            ProcessOutcome::DeadLetter { reason } => {
                service.publish_to_dlq(&msg, reason).await?;
                handle.ack().await
            }
        },
        Err(_) => {
            tracing::error!("malformed or invalid transfer message, sending to dlq");
            service
                .publish_malformed_to_dlq(key, payload, "invalid message id".to_string())
                .await?;
            handle.ack().await
        }
    }
}
