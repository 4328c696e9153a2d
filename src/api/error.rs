use axum::Json;
use axum::response::{IntoResponse, Response};

use crate::api::dto::ErrorResponse;
use crate::error::TransferError;

/// Newtype so `TransferError` (defined once for the whole crate) can
/// implement `IntoResponse` without axum needing to live in `error.rs`.
pub struct ApiError(pub TransferError);

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.http_status();
        let body = ErrorResponse {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
