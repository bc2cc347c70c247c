mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use bigdecimal::BigDecimal;
use common::{charge_success, TestApp};
use ledger_core::config::parse_allowed_ips;
use ledger_core::domain::{Transaction, TransactionDraft, TransactionStatus};
use ledger_core::ports::{
    Notification, RepositoryError, RepositoryResult, TransactionRepository, Transition,
    TransitionRecord,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_charge_success_settles_transaction() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    app.seed_pending("ref-1", owner, 50).await;

    let body = charge_success("ref-1", 5000);
    let response = app
        .app
        .clone()
        .oneshot(app.signed_webhook(&body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tx = app.repository.find_by_reference("ref-1").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Successful);
    assert_eq!(tx.amount_paid, Some(BigDecimal::from_str("50.00").unwrap()));
    assert_eq!(tx.native_amount(), Some(BigDecimal::from_str("50.00").unwrap()));
    assert_eq!(tx.raw.unwrap()["data"]["reference"], "ref-1");
    assert_eq!(
        app.notifier.recorded(),
        vec![Notification::wallet_balance_update(owner)]
    );
}

#[tokio::test]
async fn test_redelivery_is_acknowledged_without_second_notification() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    app.seed_pending("ref-1", owner, 50).await;
    let body = charge_success("ref-1", 5000);

    for _ in 0..3 {
        let response = app
            .app
            .clone()
            .oneshot(app.signed_webhook(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.notifier.recorded().len(), 1);
}

#[tokio::test]
async fn test_unknown_reference_is_acknowledged() {
    let app = TestApp::new();

    let body = charge_success("ref-unknown", 5000);
    let response = app
        .app
        .clone()
        .oneshot(app.signed_webhook(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app
        .repository
        .find_by_reference("ref-unknown")
        .await
        .unwrap()
        .is_none());
    assert!(app.notifier.recorded().is_empty());
}

#[tokio::test]
async fn test_invalid_signature_is_rejected_and_store_untouched() {
    let app = TestApp::new();
    app.seed_pending("ref-1", Uuid::new_v4(), 50).await;
    let body = charge_success("ref-1", 5000);

    let mut forged = app.signer.sign(&body);
    let last = if forged.ends_with('0') { "1" } else { "0" };
    forged.replace_range(forged.len() - 1.., last);

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/paystack")
                .header("x-paystack-signature", forged)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("sorry we could not verify the source of this request"));

    let tx = app.repository.find_by_reference("ref-1").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert!(tx.raw.is_none());
    assert!(app.notifier.recorded().is_empty());
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let app = TestApp::new();

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/paystack")
                .body(Body::from(charge_success("ref-1", 5000)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_body_modified_after_signing_is_rejected() {
    let app = TestApp::new();
    app.seed_pending("ref-1", Uuid::new_v4(), 50).await;

    let signed = charge_success("ref-1", 5000);
    let signature = app.signer.sign(&signed);
    let tampered = charge_success("ref-1", 500000);

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/paystack")
                .header("x-paystack-signature", signature)
                .body(Body::from(tampered))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authentic_malformed_payload_is_acknowledged() {
    let app = TestApp::new();
    let body = json!({ "event": "charge.success", "data": {} }).to_string().into_bytes();

    let response = app
        .app
        .clone()
        .oneshot(app.signed_webhook(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.notifier.recorded().is_empty());
}

#[tokio::test]
async fn test_non_whitelisted_source_is_forbidden() {
    let app = TestApp::build(
        Arc::new(ledger_core::adapters::InMemoryTransactionRepository::new()),
        parse_allowed_ips("52.31.139.75").unwrap(),
    );
    let body = charge_success("ref-1", 5000);
    let from_peer = |peer: [u8; 4]| {
        let mut request = app.signed_webhook(&body);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 443))));
        request
    };

    let response = app
        .app
        .clone()
        .oneshot(from_peer([198, 51, 100, 7]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Without a trusted proxy the forwarded header cannot vouch for the caller.
    let mut spoofed = from_peer([6, 6, 6, 6]);
    spoofed
        .headers_mut()
        .insert("x-forwarded-for", "52.31.139.75".parse().unwrap());
    let response = app.app.clone().oneshot(spoofed).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .app
        .clone()
        .oneshot(from_peer([52, 31, 139, 75]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Store whose writes always fail.
struct FailingRepository;

#[async_trait]
impl TransactionRepository for FailingRepository {
    async fn create(&self, draft: TransactionDraft) -> RepositoryResult<Transaction> {
        Err(RepositoryError::DuplicateReference(draft.reference))
    }

    async fn find_by_reference(&self, _reference: &str) -> RepositoryResult<Option<Transaction>> {
        Ok(None)
    }

    async fn find_by_id(&self, _id: Uuid) -> RepositoryResult<Option<Transaction>> {
        Ok(None)
    }

    async fn save(&self, _tx: &Transaction) -> RepositoryResult<()> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn update_by_reference(
        &self,
        _reference: &str,
        _transition: Transition,
    ) -> RepositoryResult<Option<TransitionRecord>> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn net_balance(&self, _owner: Uuid) -> RepositoryResult<BigDecimal> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn test_persistence_failure_asks_provider_to_retry() {
    let app = TestApp::with_repository(Arc::new(FailingRepository));
    let body = charge_success("ref-1", 5000);

    let response = app
        .app
        .clone()
        .oneshot(app.signed_webhook(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.notifier.recorded().is_empty());
}

#[tokio::test]
async fn test_health_reports_store_failure() {
    let healthy = TestApp::new();
    let response = healthy
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let failing = TestApp::with_repository(Arc::new(FailingRepository));
    let response = failing
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unhealthy");
}
