use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    PaymentProvider, Transaction, TransactionIntent, TransactionStatus, TransactionType,
};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::use_cases::{FundWallet, FundWalletInput};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct FundWalletRequest {
    /// Major units, at most two decimal places.
    #[schema(value_type = String, example = "50.00")]
    pub amount: BigDecimal,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FundWalletResponse {
    pub payment_url: String,
    pub transaction_id: Uuid,
    pub reference: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub reference: String,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    #[schema(value_type = Option<String>)]
    pub amount_paid: Option<BigDecimal>,
    #[schema(value_type = Option<String>)]
    pub native_amount: Option<BigDecimal>,
    #[schema(value_type = String, example = "WALLET_FUNDING")]
    pub intent: TransactionIntent,
    #[schema(value_type = String, example = "CREDIT")]
    pub transaction_type: TransactionType,
    #[schema(value_type = String, example = "PAYSTACK")]
    pub provider: PaymentProvider,
    #[schema(value_type = String, example = "PENDING")]
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            native_amount: tx.native_amount(),
            id: tx.id,
            reference: tx.reference,
            amount: tx.amount,
            amount_paid: tx.amount_paid,
            intent: tx.intent,
            transaction_type: tx.transaction_type,
            provider: tx.provider,
            status: tx.status,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/transactions/wallet-funding",
    request_body = FundWalletRequest,
    params(("x-user-id" = String, Header, description = "Authenticated wallet owner")),
    responses(
        (status = 201, description = "Payment initialized", body = FundWalletResponse),
        (status = 400, description = "Invalid amount or rejected by provider"),
        (status = 401, description = "Missing user identity"),
        (status = 502, description = "Payment provider unavailable")
    ),
    tag = "Transactions"
)]
pub async fn fund_wallet(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Json(request): Json<FundWalletRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }

    let use_case = FundWallet::new(state.gateway.clone(), state.repository.clone());
    let output = use_case
        .execute(FundWalletInput {
            owner,
            email: request.email,
            amount: request.amount,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FundWalletResponse {
            payment_url: output.payment_url,
            transaction_id: output.transaction_id,
            reference: output.reference,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/transactions/{id}",
    params(
        ("id" = Uuid, Path, description = "Transaction ID"),
        ("x-user-id" = String, Header, description = "Authenticated wallet owner")
    ),
    responses(
        (status = 200, description = "Transaction found", body = TransactionResponse),
        (status = 401, description = "Missing user identity"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Other owners' transactions are reported as missing.
    let tx = state
        .repository
        .find_by_id(id)
        .await?
        .filter(|tx| tx.owner == owner)
        .ok_or_else(|| AppError::NotFound(format!("Transaction {id} not found")))?;

    Ok(Json(TransactionResponse::from(tx)))
}
