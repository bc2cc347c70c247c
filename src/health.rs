use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use utoipa::ToSchema;

use crate::ports::TransactionRepository;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    #[schema(value_type = Object)]
    pub dependencies: HashMap<String, DependencyStatus>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status != "unhealthy"
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn unhealthy(error: impl Into<String>) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.into(),
        }
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a failure makes the whole service unhealthy rather than degraded.
    fn critical(&self) -> bool {
        true
    }

    async fn check(&self) -> DependencyStatus;
}

/// Checks the transaction store backing the service.
pub struct StoreChecker {
    repository: Arc<dyn TransactionRepository>,
}

impl StoreChecker {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl DependencyChecker for StoreChecker {
    fn name(&self) -> &'static str {
        "transaction_store"
    }

    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match self.repository.ping().await {
            Ok(()) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => DependencyStatus::unhealthy(e.to_string()),
        }
    }
}

pub async fn check_health(
    checkers: &[Arc<dyn DependencyChecker>],
    start_time: Instant,
) -> HealthResponse {
    let results = futures_util::future::join_all(checkers.iter().map(|checker| async move {
        let status = timeout(CHECK_TIMEOUT, checker.check())
            .await
            .unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));
        (checker.name(), checker.critical(), status)
    }))
    .await;

    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;
    let mut dependencies = HashMap::new();

    for (name, critical, status) in results {
        if matches!(status, DependencyStatus::Unhealthy { .. }) {
            if critical {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
        dependencies.insert(name.to_string(), status);
    }

    let status = if has_critical_failure {
        "unhealthy"
    } else if has_non_critical_failure {
        "degraded"
    } else {
        "healthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
