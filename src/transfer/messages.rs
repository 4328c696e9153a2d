use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The queued form of an async transfer request, published to the
/// `transactions` topic and re-published (with `retry` incremented) on
/// transient failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferMessage {
    pub id: Uuid,
    pub from: i64,
    pub to: i64,
    pub amount: i64,
    #[serde(default)]
    pub retry: u32,
}

/// A message that exhausted its retries, published to `transactions-dlq`
/// with the reason it could not be processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DlqMessage {
    #[serde(flatten)]
    pub original: TransferMessage,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_message_roundtrips_through_json() {
        let msg = TransferMessage {
            id: Uuid::new_v4(),
            from: 1,
            to: 2,
            amount: 500,
            retry: 1,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: TransferMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }

    #[test]
    fn retry_defaults_to_zero_when_absent() {
        let json = r#"{"id":"3fa85f64-5717-4562-b3fc-2c963f66afa6","from":1,"to":2,"amount":100}"#;
        let parsed: TransferMessage = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.retry, 0);
    }

    #[test]
    fn dlq_message_carries_reason_alongside_original_fields() {
        let dlq = DlqMessage {
            original: TransferMessage {
                id: Uuid::new_v4(),
                from: 1,
                to: 2,
                amount: 100,
                retry: 3,
            },
            reason: "max retries exceeded".into(),
        };
        let json = serde_json::to_string(&dlq).unwrap();
        let parsed: DlqMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(dlq, parsed);
    }
}
