//! Wire-level request/response shapes (spec §6). Amounts are
//! decimal-major-unit strings; conversion to/from integer minor units
//! happens in the handlers via [`super::currency`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub account_id: i64,
    pub initial_balance: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub account_id: i64,
    pub balance: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub from: i64,
    pub to: i64,
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub source_account_id: i64,
    pub destination_account_id: i64,
    pub amount: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AsyncTransferResponse {
    pub transaction_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AsyncTransferStatusResponse {
    pub id: Uuid,
    pub from_account: i64,
    pub to_account: i64,
    pub amount: String,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
