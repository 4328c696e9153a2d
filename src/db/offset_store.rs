use sqlx::PgPool;
use sqlx::Row;

use crate::error::TransferError;

/// Durable per-partition checkpoint for the manual offset-commit
/// contract (spec §4.7/§4.8): `KafkaConsumer` resumes from here instead
/// of replaying a topic from the beginning on every restart.
pub struct PgOffsetStore {
    pool: PgPool,
}

impl PgOffsetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the last committed offset for this topic/partition/group,
    /// or `None` if nothing has ever been committed.
    pub async fn load(
        &self,
        topic: &str,
        partition: i32,
        group: &str,
    ) -> Result<Option<i64>, TransferError> {
        let row = sqlx::query(
            "SELECT committed_offset FROM consumer_offsets
             WHERE topic = $1 AND partition = $2 AND consumer_group = $3",
        )
        .bind(topic)
        .bind(partition)
        .bind(group)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("committed_offset")))
    }

    pub async fn commit(
        &self,
        topic: &str,
        partition: i32,
        group: &str,
        offset: i64,
    ) -> Result<(), TransferError> {
        sqlx::query(
            "INSERT INTO consumer_offsets (topic, partition, consumer_group, committed_offset)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (topic, partition, consumer_group)
             DO UPDATE SET committed_offset = EXCLUDED.committed_offset",
        )
        .bind(topic)
        .bind(partition)
        .bind(group)
        .bind(offset)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
