//! Core error type and business/transient classification.
//!
//! Error codes and HTTP status mapping mirror the design doc: validation
//! and not-found errors never retry, balance and lock errors are
//! classified separately from generic infrastructure failures.

use axum::http::StatusCode;
use thiserror::Error;

/// All error kinds the core distinguishes.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("source and destination account cannot be the same")]
    SameAccount,

    #[error("invalid account id")]
    InvalidAccountId,

    #[error("account not found")]
    AccountNotFound,

    #[error("transaction not found")]
    TransactionNotFound,

    #[error("account already exists")]
    AccountAlreadyExists,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("lock acquisition failed")]
    LockAcquisitionFailed,

    #[error("operation cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(String),

    #[error("message transport error: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable machine-readable code, for API responses and logging.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::InvalidAccountId => "INVALID_ACCOUNT_ID",
            TransferError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            TransferError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            TransferError::AccountAlreadyExists => "ACCOUNT_ALREADY_EXISTS",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::LockAcquisitionFailed => "LOCK_ACQUISITION_FAILED",
            TransferError::Cancelled => "CANCELLED",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Transport(_) => "TRANSPORT_ERROR",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Suggested HTTP status for the sync request path (spec §6).
    pub fn http_status(&self) -> StatusCode {
        match self {
            TransferError::InvalidAmount
            | TransferError::SameAccount
            | TransferError::InvalidAccountId => StatusCode::BAD_REQUEST,
            TransferError::AccountNotFound | TransferError::TransactionNotFound => {
                StatusCode::NOT_FOUND
            }
            TransferError::AccountAlreadyExists => StatusCode::CONFLICT,
            TransferError::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
            TransferError::LockAcquisitionFailed | TransferError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TransferError::Database(_) | TransferError::Transport(_) | TransferError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Business errors are rejected by the async processor without retry
    /// (spec §4.7, §7): `{InsufficientBalance, AccountNotFound,
    /// InvalidAmount, SameAccount}`. Everything else is transient.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            TransferError::InsufficientBalance
                | TransferError::AccountNotFound
                | TransferError::InvalidAmount
                | TransferError::SameAccount
        )
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_classified() {
        assert!(TransferError::InsufficientBalance.is_business());
        assert!(TransferError::AccountNotFound.is_business());
        assert!(TransferError::InvalidAmount.is_business());
        assert!(TransferError::SameAccount.is_business());
    }

    #[test]
    fn transient_errors_classified() {
        assert!(!TransferError::LockAcquisitionFailed.is_business());
        assert!(!TransferError::Database("timeout".into()).is_business());
        assert!(!TransferError::Transport("broker down".into()).is_business());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(TransferError::InvalidAmount.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TransferError::InsufficientBalance.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            TransferError::LockAcquisitionFailed.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(TransferError::AccountNotFound.http_status(), StatusCode::NOT_FOUND);
    }
}
