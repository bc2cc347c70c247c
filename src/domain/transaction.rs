//! Transaction domain entity.
//! Framework-agnostic representation of a wallet transaction and its lifecycle enums.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lifecycle status. `Successful` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Successful,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Successful | TransactionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Successful => "SUCCESSFUL",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESSFUL" => Ok(TransactionStatus::Successful),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(UnknownVariant::new("status", other)),
        }
    }
}

/// Direction of the money movement relative to the owner's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(TransactionType::Credit),
            "DEBIT" => Ok(TransactionType::Debit),
            other => Err(UnknownVariant::new("transaction type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionIntent {
    WalletFunding,
}

impl TransactionIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionIntent::WalletFunding => "WALLET_FUNDING",
        }
    }
}

impl FromStr for TransactionIntent {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WALLET_FUNDING" => Ok(TransactionIntent::WalletFunding),
            other => Err(UnknownVariant::new("intent", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    Paystack,
}

impl PaymentProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentProvider::Paystack => "PAYSTACK",
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYSTACK" => Ok(PaymentProvider::Paystack),
            other => Err(UnknownVariant::new("provider", other)),
        }
    }
}

/// Everything the caller supplies when opening a transaction.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub reference: String,
    pub amount: BigDecimal,
    pub intent: TransactionIntent,
    pub transaction_type: TransactionType,
    pub provider: PaymentProvider,
    pub owner: Uuid,
}

/// Domain entity representing a transaction.
///
/// The signed native amount is not stored on the entity; it is always derived from
/// `amount_paid` and `transaction_type` through [`Transaction::native_amount`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub amount: BigDecimal,
    pub amount_paid: Option<BigDecimal>,
    pub intent: TransactionIntent,
    pub transaction_type: TransactionType,
    pub provider: PaymentProvider,
    pub status: TransactionStatus,
    pub owner: Uuid,
    pub raw: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Opens a new PENDING transaction from a draft.
    pub fn open(draft: TransactionDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference: draft.reference,
            amount: draft.amount,
            amount_paid: None,
            intent: draft.intent,
            transaction_type: draft.transaction_type,
            provider: draft.provider,
            status: TransactionStatus::Pending,
            owner: draft.owner,
            raw: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Signed amount applied to the owner's wallet.
    pub fn native_amount(&self) -> Option<BigDecimal> {
        self.amount_paid.as_ref().map(|paid| match self.transaction_type {
            TransactionType::Credit => paid.clone(),
            TransactionType::Debit => -paid.clone(),
        })
    }
}
