use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::api::currency::{format_amount, parse_amount};
use crate::api::dto::{
    AccountResponse, AsyncTransferResponse, AsyncTransferStatusResponse, CreateAccountRequest,
    HealthResponse, TransactionResponse, TransferRequest,
};
use crate::api::error::ApiError;
use crate::api::state::AppState;

#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.db.health_check().await.map_err(crate::error::TransferError::from)?;
    Ok(Json(HealthResponse { status: "ok" }))
}

#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses((status = 201, body = AccountResponse))
)]
pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let initial_balance = parse_amount(&req.initial_balance)?;
    let account = state
        .service
        .create_account(req.account_id, initial_balance)
        .await?;

    tracing::info!(account_id = account.account_id, "account created");
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            account_id: account.account_id,
            balance: format_amount(account.balance),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/accounts/{account_id}",
    params(("account_id" = i64, Path)),
    responses((status = 200, body = AccountResponse))
)]
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.service.get_account(account_id).await?;
    Ok(Json(AccountResponse {
        account_id: account.account_id,
        balance: format_amount(account.balance),
    }))
}

#[utoipa::path(
    post,
    path = "/transactions",
    request_body = TransferRequest,
    responses((status = 200, body = TransactionResponse))
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let amount = parse_amount(&req.amount)?;
    let txn = state
        .service
        .transfer(req.from, req.to, amount, &state.shutdown)
        .await?;

    tracing::info!(transfer_id = %txn.id, from = req.from, to = req.to, "transfer completed");
    Ok((
        StatusCode::OK,
        Json(TransactionResponse {
            id: txn.id,
            source_account_id: txn.source_account_id,
            destination_account_id: txn.destination_account_id,
            amount: format_amount(txn.amount),
            created_at: txn.created_at,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/async-transactions",
    request_body = TransferRequest,
    responses((status = 202, body = AsyncTransferResponse))
)]
pub async fn create_async_transaction(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<AsyncTransferResponse>), ApiError> {
    let amount = parse_amount(&req.amount)?;
    let id = state.service.submit_transfer(req.from, req.to, amount).await?;

    tracing::info!(transfer_id = %id, "async transfer submitted");
    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncTransferResponse {
            transaction_id: id,
            status: "pending".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/async-transactions/{id}/status",
    params(("id" = Uuid, Path)),
    responses((status = 200, body = AsyncTransferStatusResponse))
)]
pub async fn get_async_transaction_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AsyncTransferStatusResponse>, ApiError> {
    let record = state.service.get_status(id).await?;
    Ok(Json(AsyncTransferStatusResponse {
        id: record.id,
        from_account: record.from_account,
        to_account: record.to_account,
        amount: format_amount(record.amount),
        status: record.status.as_str().to_string(),
        error: record.error,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}
