use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::ports::{Notification, RepositoryResult, Topic, TransactionRepository};

/// Keeps a per-owner wallet balance recomputed from settled transactions whenever a
/// balance update notification arrives.
pub struct BalanceProjector {
    repository: Arc<dyn TransactionRepository>,
    balances: RwLock<HashMap<Uuid, BigDecimal>>,
}

impl BalanceProjector {
    pub fn new(repository: Arc<dyn TransactionRepository>) -> Self {
        Self {
            repository,
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub async fn recompute(&self, owner: Uuid) -> RepositoryResult<BigDecimal> {
        let balance = self.repository.net_balance(owner).await?;
        self.balances.write().await.insert(owner, balance.clone());
        Ok(balance)
    }

    /// Cached balance, computed on a miss.
    pub async fn balance(&self, owner: Uuid) -> RepositoryResult<BigDecimal> {
        if let Some(balance) = self.balances.read().await.get(&owner).cloned() {
            return Ok(balance);
        }
        self.recompute(owner).await
    }

    /// Drains the notification queue until every sender is dropped.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<Notification>) {
        info!("Wallet balance projector started");

        while let Some(notification) = rx.recv().await {
            match notification.topic {
                Topic::WalletBalanceUpdate => match self.recompute(notification.owner).await {
                    Ok(balance) => debug!(owner = %notification.owner, %balance, "wallet balance recomputed"),
                    Err(e) => error!(owner = %notification.owner, error = %e, "wallet balance recompute failed"),
                },
            }
        }

        info!("Wallet balance projector stopped");
    }
}
