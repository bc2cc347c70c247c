//! Matches verified provider notifications to local transactions.

use std::sync::Arc;
use thiserror::Error;
use tracing::field::{display, Empty};
use uuid::Uuid;

use crate::domain::{state_machine, Transaction, TransactionStatus};
use crate::ports::{EventNotifier, Notification, RepositoryError, TransactionRepository};
use crate::services::signature::{InvalidSignature, SignatureVerifier};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    InvalidSignature(#[from] InvalidSignature),

    /// The store could not complete the update; the provider should retry.
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

/// What happened to an authenticated notification. Every variant is acknowledged
/// to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Status moved; one balance notification was emitted.
    Transitioned {
        transaction_id: Uuid,
        from: TransactionStatus,
        to: TransactionStatus,
    },
    /// Only the raw payload was recorded.
    Recorded { transaction_id: Uuid },
    /// No local transaction carries this reference.
    UnknownReference { reference: String },
    /// Authentic but unparseable payload.
    Ignored,
}

pub struct WebhookReconciler {
    verifier: Arc<dyn SignatureVerifier>,
    repository: Arc<dyn TransactionRepository>,
    notifier: Arc<dyn EventNotifier>,
}

impl WebhookReconciler {
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        repository: Arc<dyn TransactionRepository>,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            verifier,
            repository,
            notifier,
        }
    }

    #[tracing::instrument(
        name = "reconcile",
        skip_all,
        fields(reference = Empty, event = Empty)
    )]
    pub async fn handle(
        &self,
        signature: &str,
        raw_body: &[u8],
    ) -> Result<Acknowledgement, ReconcileError> {
        let payload = self.verifier.verify(signature, raw_body).map_err(|e| {
            tracing::warn!("rejected provider notification with invalid signature");
            e
        })?;

        let event = match payload.parse() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring authenticated but malformed notification");
                return Ok(Acknowledgement::Ignored);
            }
        };

        let span = tracing::Span::current();
        span.record("reference", display(&event.reference));
        span.record("event", display(event.kind.as_str()));

        let reference = event.reference.clone();
        let record = self
            .repository
            .update_by_reference(
                &reference,
                Box::new(move |current: &Transaction| state_machine::apply(&event, current)),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to persist notification");
                e
            })?;

        let Some(record) = record else {
            tracing::warn!("notification references an unknown transaction");
            return Ok(Acknowledgement::UnknownReference { reference });
        };

        if !record.status_changed() {
            tracing::info!(
                transaction_id = %record.after.id,
                status = %record.after.status,
                "notification recorded without status change"
            );
            return Ok(Acknowledgement::Recorded {
                transaction_id: record.after.id,
            });
        }

        tracing::info!(
            transaction_id = %record.after.id,
            from = %record.before.status,
            to = %record.after.status,
            "transaction status updated"
        );

        let owner = record.after.owner;
        if let Err(e) = self
            .notifier
            .notify(Notification::wallet_balance_update(owner))
            .await
        {
            tracing::error!(error = %e, %owner, "failed to emit wallet balance update");
        }

        Ok(Acknowledgement::Transitioned {
            transaction_id: record.after.id,
            from: record.before.status,
            to: record.after.status,
        })
    }
}
