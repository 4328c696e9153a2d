use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Status of a submitted async transfer, keyed by the id the caller
/// receives from `POST /async-transactions`. Decoupled from the ledger:
/// this row can say `failed` for a transfer that never produced a
/// `Transaction` (spec's status-vs-ledger design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }

    /// Once a status leaves `Pending` it cannot move again (spec's
    /// monotonic status invariant).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TxStatus::Pending),
            "completed" => Ok(TxStatus::Completed),
            "failed" => Ok(TxStatus::Failed),
            other => Err(format!("unknown tx status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncTransaction {
    pub id: Uuid,
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
    pub status: TxStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AsyncTransaction {
    pub fn new_pending(
        id: Uuid,
        from_account: i64,
        to_account: i64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            from_account,
            to_account,
            amount,
            status: TxStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TxStatus::Pending.is_terminal());
        assert!(TxStatus::Completed.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
    }

    #[test]
    fn roundtrip_through_str() {
        for s in [TxStatus::Pending, TxStatus::Completed, TxStatus::Failed] {
            let parsed: TxStatus = s.as_str().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn invalid_status_string_rejected() {
        assert!("bogus".parse::<TxStatus>().is_err());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(TxStatus::Completed.to_string(), "completed");
    }
}
