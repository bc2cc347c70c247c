mod common;

use axum::http::StatusCode;
use common::{charge_success, TestApp};
use futures_util::future::join_all;
use ledger_core::domain::TransactionStatus;
use ledger_core::ports::Notification;
use tower::ServiceExt;
use uuid::Uuid;

const DELIVERIES: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_deliveries_notify_once() {
    let app = TestApp::new();
    let owner = Uuid::new_v4();
    app.seed_pending("ref-1", owner, 50).await;
    let body = charge_success("ref-1", 5000);

    let handles = (0..DELIVERIES).map(|_| {
        let router = app.app.clone();
        let request = app.signed_webhook(&body);
        tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
    });

    for status in join_all(handles).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let tx = app.repository.find_by_reference("ref-1").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Successful);
    assert_eq!(
        app.notifier.recorded(),
        vec![Notification::wallet_balance_update(owner)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_for_different_references() {
    let app = TestApp::new();
    let owners: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    for (i, owner) in owners.iter().enumerate() {
        app.seed_pending(&format!("ref-{i}"), *owner, 10).await;
    }

    let handles = (0..DELIVERIES).map(|n| {
        let router = app.app.clone();
        let request = app.signed_webhook(&charge_success(&format!("ref-{}", n % 4), 1000));
        tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
    });

    for status in join_all(handles).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let mut notified: Vec<Uuid> = app.notifier.recorded().into_iter().map(|n| n.owner).collect();
    let mut expected = owners.clone();
    notified.sort();
    expected.sort();
    assert_eq!(notified, expected);
}
