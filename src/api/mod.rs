//! HTTP surface (spec §6): axum router, handlers, DTOs, and the
//! currency-string <-> minor-unit conversion at the wire boundary.

pub mod currency;
mod dto;
mod error;
mod handlers;
mod state;

pub use state::AppState;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::create_account,
        handlers::get_account,
        handlers::create_transaction,
        handlers::create_async_transaction,
        handlers::get_async_transaction_status,
    ),
    components(schemas(
        dto::HealthResponse,
        dto::CreateAccountRequest,
        dto::AccountResponse,
        dto::TransferRequest,
        dto::TransactionResponse,
        dto::AsyncTransferResponse,
        dto::AsyncTransferStatusResponse,
        dto::ErrorResponse,
    ))
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/accounts",
            post(handlers::create_account),
        )
        .route("/accounts/{account_id}", get(handlers::get_account))
        .route("/transactions", post(handlers::create_transaction))
        .route(
            "/async-transactions",
            post(handlers::create_async_transaction),
        )
        .route(
            "/async-transactions/{id}/status",
            get(handlers::get_async_transaction_status),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
