use async_trait::async_trait;
use rskafka::client::Client;
use rskafka::client::partition::{Compression, UnknownTopicHandling};
use rskafka::record::Record;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::TransferError;
use crate::ports::{Message, MessageProducer};

/// One `rskafka::client::partition::PartitionClient` per topic, built
/// lazily and cached. Every topic this service publishes to
/// (`transactions`, `transactions-dlq`) is single-partition, so a
/// producer never needs a partitioner.
pub struct KafkaProducer {
    client: Client,
    partitions: Mutex<HashMap<String, rskafka::client::partition::PartitionClient>>,
}

impl KafkaProducer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            partitions: Mutex::new(HashMap::new()),
        }
    }

    async fn partition_client(
        &self,
        topic: &str,
    ) -> Result<(), TransferError> {
        let mut partitions = self.partitions.lock().await;
        if partitions.contains_key(topic) {
            return Ok(());
        }
        let pc = self
            .client
            .partition_client(topic, 0, UnknownTopicHandling::Retry)
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;
        partitions.insert(topic.to_string(), pc);
        Ok(())
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn publish(&self, topic: &str, message: Message) -> Result<(), TransferError> {
        self.partition_client(topic).await?;
        let partitions = self.partitions.lock().await;
        let pc = partitions.get(topic).expect("just inserted above");

        let record = Record {
            key: Some(message.key),
            value: Some(message.value),
            headers: Default::default(),
            timestamp: time::OffsetDateTime::now_utc(),
        };

        pc.produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|e| TransferError::Transport(e.to_string()))?;

        tracing::debug!(topic, "published message");
        Ok(())
    }
}
