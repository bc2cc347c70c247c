use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::{GatewayError, RepositoryError};
use crate::services::ReconcileError;
use crate::use_cases::FundWalletError;

pub const SIGNATURE_REJECTED: &str = "sorry we could not verify the source of this request";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Payment provider error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Persistence(RepositoryError::DuplicateReference(_)) => StatusCode::CONFLICT,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(GatewayError::Rejected(_)) => StatusCode::BAD_REQUEST,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message returned to the caller. Server-side failures are logged and replaced
    /// with a generic message.
    fn public_message(&self) -> String {
        match self {
            AppError::Persistence(RepositoryError::DuplicateReference(reference)) => {
                format!("Conflict: transaction reference {reference} already exists")
            }
            AppError::Persistence(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            AppError::Gateway(GatewayError::Rejected(msg)) => {
                format!("Payment provider rejected the request: {msg}")
            }
            AppError::Gateway(_) => "Payment provider is unavailable".to_string(),
            AppError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::InvalidSignature(_) => {
                AppError::Unauthorized(SIGNATURE_REJECTED.to_string())
            }
            ReconcileError::Persistence(e) => AppError::Unavailable(e.to_string()),
        }
    }
}

impl From<FundWalletError> for AppError {
    fn from(err: FundWalletError) -> Self {
        match err {
            FundWalletError::InvalidAmount(msg) => AppError::Validation(msg),
            FundWalletError::Gateway(e) => AppError::Gateway(e),
            FundWalletError::Repository(e) => AppError::Persistence(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
