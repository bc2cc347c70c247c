use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{ChargeHandle, GatewayError, PaymentGateway};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    amount: i64,
    email: &'a str,
    /// Paystack expects metadata as a JSON-encoded string.
    metadata: String,
}

/// Envelope shared by Paystack API responses.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

/// HTTP client for the Paystack transaction API
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PaystackClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self::with_circuit_breaker(base_url, secret_key, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        secret_key: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PaystackClient {
            client,
            base_url,
            secret_key,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        amount_minor: i64,
        email: &str,
        metadata: serde_json::Value,
    ) -> Result<ChargeHandle, GatewayError> {
        let url = format!(
            "{}/transaction/initialize",
            self.base_url.trim_end_matches('/')
        );
        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&InitializeRequest {
                amount: amount_minor,
                email,
                metadata: metadata.to_string(),
            });

        // Requests the provider refused on their merits do not count against the breaker.
        let is_outage = |e: &GatewayError| !matches!(e, GatewayError::Rejected(_));

        let result = self
            .circuit_breaker
            .call_with(is_outage, async move {
                let response = request.send().await?;
                let status = response.status();

                // Paystack reports validation problems as 4xx with `status: false`.
                let body = response
                    .json::<ApiResponse<ChargeHandle>>()
                    .await
                    .map_err(|e| GatewayError::InvalidResponse(format!("{status}: {e}")))?;

                match (body.status, body.data) {
                    (true, Some(handle)) => Ok(handle),
                    (true, None) => Err(GatewayError::InvalidResponse(
                        "missing data in initialize response".to_string(),
                    )),
                    (false, _) => Err(GatewayError::Rejected(body.message)),
                }
            })
            .await;

        match result {
            Ok(handle) => Ok(handle),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "Paystack API circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paystack_client_creation() {
        let client = PaystackClient::new(DEFAULT_BASE_URL.to_string(), "sk_test".to_string());
        assert_eq!(client.base_url, "https://api.paystack.co");
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_initialize_transaction() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/transaction/initialize")
            .match_header("authorization", "Bearer sk_test_123")
            .match_body(mockito::Matcher::PartialJson(json!({
                "amount": 10000,
                "email": "ada@example.com"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "status": true,
                    "message": "Authorization URL created",
                    "data": {
                        "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                        "access_code": "0peioxfhpn",
                        "reference": "7PVGX8MEk85tgeEpVDtD"
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), "sk_test_123".to_string());
        let handle = client
            .initialize_transaction(10000, "ada@example.com", json!({"intent": "WALLET_FUNDING"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(handle.reference, "7PVGX8MEk85tgeEpVDtD");
        assert_eq!(
            handle.authorization_url,
            "https://checkout.paystack.com/0peioxfhpn"
        );
    }

    #[tokio::test]
    async fn test_initialize_transaction_rejected() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/transaction/initialize")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": false, "message": "Invalid Email Address Passed"}"#)
            .create_async()
            .await;

        let client = PaystackClient::new(server.url(), "sk_test_123".to_string());
        let result = client
            .initialize_transaction(10000, "not-an-email", json!({}))
            .await;

        assert!(matches!(result, Err(GatewayError::Rejected(msg)) if msg == "Invalid Email Address Passed"));
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/transaction/initialize")
            .with_status(500)
            .with_body("upstream unavailable")
            .expect_at_least(2)
            .create_async()
            .await;

        let client =
            PaystackClient::with_circuit_breaker(server.url(), "sk_test_123".to_string(), 2, 60);

        for _ in 0..2 {
            let _ = client.initialize_transaction(100, "a@b.co", json!({})).await;
        }

        let result = client.initialize_transaction(100, "a@b.co", json!({})).await;
        assert!(matches!(result, Err(GatewayError::CircuitBreakerOpen(_))));
        assert_eq!(client.circuit_state(), "open");
    }
}
