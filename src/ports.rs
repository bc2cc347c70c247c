//! Capability interfaces the core depends on: persistence, the payment gateway and
//! the outbound notification queue.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Transaction, TransactionDraft};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),

    #[error("Corrupt transaction record: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Transition applied under the store's per-reference lock.
pub type Transition = Box<dyn FnOnce(&Transaction) -> Transaction + Send>;

/// State of a record on both sides of a serialized update.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub before: Transaction,
    pub after: Transaction,
}

impl TransitionRecord {
    pub fn status_changed(&self) -> bool {
        self.before.status != self.after.status
    }
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Persists a new PENDING transaction built from `draft`.
    async fn create(&self, draft: TransactionDraft) -> RepositoryResult<Transaction>;

    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Transaction>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>>;

    /// Writes the mutable state of an existing transaction.
    async fn save(&self, tx: &Transaction) -> RepositoryResult<()>;

    /// Reads, transforms and writes the record for `reference` while holding an
    /// exclusive lock on it. Returns `None` when no such record exists.
    async fn update_by_reference(
        &self,
        reference: &str,
        transition: Transition,
    ) -> RepositoryResult<Option<TransitionRecord>>;

    /// Sum of native amounts over the owner's successful transactions.
    async fn net_balance(&self, owner: Uuid) -> RepositoryResult<BigDecimal>;

    async fn ping(&self) -> RepositoryResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "wallet-balance-update")]
    WalletBalanceUpdate,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::WalletBalanceUpdate => "wallet-balance-update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub topic: Topic,
    pub owner: Uuid,
}

impl Notification {
    pub fn wallet_balance_update(owner: Uuid) -> Self {
        Self {
            topic: Topic::WalletBalanceUpdate,
            owner,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("notification queue closed")]
    Closed,
}

/// Outbound lifecycle messages. Delivery guarantees belong to the implementation.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifierError>;
}

/// Handle returned by the provider when a charge is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChargeHandle {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Provider rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Asks the provider for a payment handle. `amount_minor` is in kobo and
    /// `metadata` is echoed back on the provider's notifications.
    async fn initialize_transaction(
        &self,
        amount_minor: i64,
        email: &str,
        metadata: serde_json::Value,
    ) -> Result<ChargeHandle, GatewayError>;
}
