use axum::{extract::State, Json};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub owner: Uuid,
    /// Sum of signed amounts over successful transactions.
    #[schema(value_type = String, example = "150.00")]
    pub balance: BigDecimal,
}

#[utoipa::path(
    get,
    path = "/wallets/me/balance",
    params(("x-user-id" = String, Header, description = "Authenticated wallet owner")),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Missing user identity")
    ),
    tag = "Wallets"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state.balances.balance(owner).await?;
    Ok(Json(BalanceResponse { owner, balance }))
}
