use async_trait::async_trait;
use futures::{StreamExt, future::BoxFuture};
use rskafka::client::Client;
use rskafka::client::consumer::{StartOffset, StreamConsumerBuilder};
use rskafka::client::partition::UnknownTopicHandling;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::PgOffsetStore;
use crate::error::TransferError;
use crate::ports::{Message, MessageConsumer, MessageHandle};

const PARTITION: i32 = 0;

pub struct KafkaConsumer {
    client: Client,
    offsets: Arc<PgOffsetStore>,
}

impl KafkaConsumer {
    pub fn new(client: Client, pool: PgPool) -> Self {
        Self {
            client,
            offsets: Arc::new(PgOffsetStore::new(pool)),
        }
    }
}

struct RecordHandle {
    message: Message,
    offset: i64,
    topic: String,
    group: String,
    offsets: Arc<PgOffsetStore>,
}

#[async_trait]
impl MessageHandle for RecordHandle {
    fn message(&self) -> &Message {
        &self.message
    }

    /// Persists `offset` as the last committed checkpoint for this
    /// topic/partition/group so a restart resumes here instead of
    /// replaying from the beginning (spec §4.7/§4.8).
    async fn ack(self: Box<Self>) -> Result<(), TransferError> {
        self.offsets
            .commit(&self.topic, PARTITION, &self.group, self.offset)
            .await
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        handler: Box<
            dyn Fn(Box<dyn MessageHandle>) -> BoxFuture<'static, Result<(), TransferError>> + Send + Sync,
        >,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> Result<(), TransferError> {
        let committed = self.offsets.load(topic, PARTITION, group).await?;
        let start_offset = match committed {
            Some(offset) => StartOffset::At(offset + 1),
            None => StartOffset::Earliest,
        };
        tracing::info!(topic, group, ?committed, "subscribing to topic");

        let partition_client = self
            .client
            .partition_client(topic, PARTITION, UnknownTopicHandling::Retry)
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        let mut stream = StreamConsumerBuilder::new(Arc::new(partition_client), start_offset).build();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(topic, "consumer loop shutting down");
                    return Ok(());
                }
                next = stream.next() => {
                    match next {
                        Some(Ok((record_and_offset, _watermark))) => {
                            let message = Message {
                                key: record_and_offset.record.key.unwrap_or_default(),
                                value: record_and_offset.record.value.unwrap_or_default(),
                            };
                            let handle = Box::new(RecordHandle {
                                message,
                                offset: record_and_offset.offset,
                                topic: topic.to_string(),
                                group: group.to_string(),
                                offsets: self.offsets.clone(),
                            });
                            if let Err(e) = handler(handle).await {
                                tracing::error!(error = %e, topic, offset = record_and_offset.offset, "handler failed, offset not committed");
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!(error = %e, topic, "error reading from broker");
                        }
                        None => {
                            tracing::warn!(topic, "consumer stream ended");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
