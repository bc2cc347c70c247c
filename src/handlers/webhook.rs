use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::error::{AppError, SIGNATURE_REJECTED};
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Receives a Paystack notification. The body is taken as raw bytes because the
/// signature covers the exact payload that was sent.
#[utoipa::path(
    post,
    path = "/webhooks/paystack",
    request_body(content = String, description = "Raw provider event JSON", content_type = "application/json"),
    params(
        ("x-paystack-signature" = String, Header, description = "Hex HMAC-SHA512 of the body")
    ),
    responses(
        (status = 200, description = "Notification acknowledged"),
        (status = 401, description = "Signature missing or invalid"),
        (status = 403, description = "Source address not allowed"),
        (status = 503, description = "Could not persist; provider should retry")
    ),
    tag = "Webhooks"
)]
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("provider notification without signature header");
            AppError::Unauthorized(SIGNATURE_REJECTED.to_string())
        })?;

    let ack = state.reconciler.handle(signature, &body).await?;
    tracing::debug!(?ack, "provider notification acknowledged");

    Ok((StatusCode::OK, "ok"))
}
