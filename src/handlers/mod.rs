pub mod transactions;
pub mod wallets;
pub mod webhook;

use crate::health::{check_health, HealthResponse};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Transaction store is unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_health(&state.health_checkers, state.start_time).await;

    let status_code = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(report))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        webhook::paystack_webhook,
        transactions::fund_wallet,
        transactions::get_transaction,
        wallets::get_balance
    ),
    components(schemas(
        HealthResponse,
        transactions::FundWalletRequest,
        transactions::FundWalletResponse,
        transactions::TransactionResponse,
        wallets::BalanceResponse
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Webhooks", description = "Payment provider notifications"),
        (name = "Transactions", description = "Wallet funding transactions"),
        (name = "Wallets", description = "Wallet balances")
    )
)]
pub struct ApiDoc;
