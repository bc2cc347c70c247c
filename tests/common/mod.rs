#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use bigdecimal::BigDecimal;
use ledger_core::adapters::{InMemoryTransactionRepository, RecordingNotifier};
use ledger_core::config::AllowedIps;
use ledger_core::domain::{
    PaymentProvider, Transaction, TransactionDraft, TransactionIntent, TransactionType,
};
use ledger_core::health::{DependencyChecker, StoreChecker};
use ledger_core::ports::{ChargeHandle, GatewayError, PaymentGateway, TransactionRepository};
use ledger_core::services::{BalanceProjector, HmacSha512Verifier, WebhookReconciler};
use ledger_core::{create_app, AppState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub const SECRET: &str = "sk_test_integration";

/// Hands out sequential provider references like `ref-1`, `ref-2`.
#[derive(Default)]
pub struct StubGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize_transaction(
        &self,
        _amount_minor: i64,
        _email: &str,
        _metadata: serde_json::Value,
    ) -> Result<ChargeHandle, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ChargeHandle {
            authorization_url: format!("https://checkout.paystack.com/access-{n}"),
            access_code: format!("access-{n}"),
            reference: format!("ref-{n}"),
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub repository: Arc<dyn TransactionRepository>,
    pub notifier: RecordingNotifier,
    pub signer: HmacSha512Verifier,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryTransactionRepository::new()))
    }

    pub fn with_repository(repository: Arc<dyn TransactionRepository>) -> Self {
        Self::build(repository, AllowedIps::Any)
    }

    pub fn build(repository: Arc<dyn TransactionRepository>, allowed_ips: AllowedIps) -> Self {
        let notifier = RecordingNotifier::new();
        let signer = HmacSha512Verifier::new(SECRET);
        let reconciler = WebhookReconciler::new(
            Arc::new(signer.clone()),
            repository.clone(),
            Arc::new(notifier.clone()),
        );
        let health_checkers: Vec<Arc<dyn DependencyChecker>> =
            vec![Arc::new(StoreChecker::new(repository.clone()))];

        let state = AppState {
            repository: repository.clone(),
            gateway: Arc::new(StubGateway::default()),
            reconciler: Arc::new(reconciler),
            balances: Arc::new(BalanceProjector::new(repository.clone())),
            health_checkers,
            webhook_allowed_ips: allowed_ips,
            trusted_proxy_depth: 0,
            start_time: Instant::now(),
        };

        Self {
            app: create_app(state),
            repository,
            notifier,
            signer,
        }
    }

    pub async fn seed_pending(&self, reference: &str, owner: Uuid, amount: i64) -> Transaction {
        self.repository
            .create(TransactionDraft {
                reference: reference.to_string(),
                amount: BigDecimal::from(amount),
                intent: TransactionIntent::WalletFunding,
                transaction_type: TransactionType::Credit,
                provider: PaymentProvider::Paystack,
                owner,
            })
            .await
            .unwrap()
    }

    pub fn signed_webhook(&self, body: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhooks/paystack")
            .header("content-type", "application/json")
            .header("x-paystack-signature", self.signer.sign(body))
            .body(Body::from(body.to_vec()))
            .unwrap()
    }
}

pub fn charge_success(reference: &str, amount_minor: i64) -> Vec<u8> {
    json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "amount": amount_minor,
            "currency": "NGN",
            "customer": { "email": "customer@example.com" }
        }
    })
    .to_string()
    .into_bytes()
}
