//! Fund wallet use case.
//! Requests a payment handle from the provider and opens a PENDING credit transaction.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{PaymentProvider, TransactionDraft, TransactionIntent, TransactionType};
use crate::ports::{GatewayError, PaymentGateway, RepositoryError, TransactionRepository};

/// Input for the FundWallet use case.
#[derive(Debug)]
pub struct FundWalletInput {
    pub owner: Uuid,
    pub email: String,
    pub amount: BigDecimal,
}

/// Output of the FundWallet use case.
#[derive(Debug)]
pub struct FundWalletOutput {
    pub transaction_id: Uuid,
    pub payment_url: String,
    pub reference: String,
}

#[derive(Debug, Error)]
pub enum FundWalletError {
    #[error("{0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Use case for starting a wallet funding payment.
pub struct FundWallet {
    gateway: Arc<dyn PaymentGateway>,
    transaction_repository: Arc<dyn TransactionRepository>,
}

impl FundWallet {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        transaction_repository: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            gateway,
            transaction_repository,
        }
    }

    pub async fn execute(&self, input: FundWalletInput) -> Result<FundWalletOutput, FundWalletError> {
        let amount_minor = to_minor_units(&input.amount)?;
        let intent = TransactionIntent::WalletFunding;
        let metadata = json!({
            "user_id": input.owner,
            "intent": intent.as_str(),
        });

        let handle = self
            .gateway
            .initialize_transaction(amount_minor, &input.email, metadata)
            .await?;

        let tx = self
            .transaction_repository
            .create(TransactionDraft {
                reference: handle.reference.clone(),
                amount: input.amount,
                intent,
                transaction_type: TransactionType::Credit,
                provider: PaymentProvider::Paystack,
                owner: input.owner,
            })
            .await?;

        tracing::info!(
            transaction_id = %tx.id,
            reference = %tx.reference,
            owner = %tx.owner,
            "wallet funding initialized"
        );

        Ok(FundWalletOutput {
            transaction_id: tx.id,
            payment_url: handle.authorization_url,
            reference: handle.reference,
        })
    }
}

/// Converts a major-unit amount to kobo. At most two decimal places are accepted.
fn to_minor_units(amount: &BigDecimal) -> Result<i64, FundWalletError> {
    if amount <= &BigDecimal::zero() {
        return Err(FundWalletError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }

    let minor = amount.clone() * BigDecimal::from(100);
    if minor.with_scale(0) != minor {
        return Err(FundWalletError::InvalidAmount(
            "amount must have at most two decimal places".to_string(),
        ));
    }

    minor
        .to_i64()
        .ok_or_else(|| FundWalletError::InvalidAmount("amount is too large".to_string()))
}
