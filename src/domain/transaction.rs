use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An immutable ledger record of one completed transfer. Created inside
/// the same database transaction as the two balance updates it records
/// (spec §4.5) — it never exists without them, and it is never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: Uuid,
        source_account_id: i64,
        destination_account_id: i64,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            source_account_id,
            destination_account_id,
            amount,
            created_at,
        }
    }
}
