//! In-memory implementation of TransactionRepository.
//! Used when no database is configured and by the test suites.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::{Transaction, TransactionDraft, TransactionStatus};
use crate::ports::{
    RepositoryError, RepositoryResult, TransactionRepository, Transition, TransitionRecord,
};

#[derive(Default)]
struct Index {
    by_reference: HashMap<String, Arc<Mutex<Transaction>>>,
    reference_by_id: HashMap<Uuid, String>,
}

/// Each record sits behind its own mutex, so updates to one reference never wait
/// on another.
#[derive(Default, Clone)]
pub struct InMemoryTransactionRepository {
    index: Arc<RwLock<Index>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, reference: &str) -> Option<Arc<Mutex<Transaction>>> {
        self.index.read().await.by_reference.get(reference).cloned()
    }
}

/// Copies only the fields a transaction may change after creation.
fn write_mutable_state(stored: &mut Transaction, tx: &Transaction) {
    stored.status = tx.status;
    stored.amount_paid = tx.amount_paid.clone();
    stored.raw = tx.raw.clone();
    stored.updated_at = Utc::now();
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create(&self, draft: TransactionDraft) -> RepositoryResult<Transaction> {
        let mut index = self.index.write().await;
        if index.by_reference.contains_key(&draft.reference) {
            return Err(RepositoryError::DuplicateReference(draft.reference));
        }

        let tx = Transaction::open(draft);
        index.reference_by_id.insert(tx.id, tx.reference.clone());
        index
            .by_reference
            .insert(tx.reference.clone(), Arc::new(Mutex::new(tx.clone())));
        Ok(tx)
    }

    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Transaction>> {
        match self.record(reference).await {
            Some(record) => Ok(Some(record.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let reference = self.index.read().await.reference_by_id.get(&id).cloned();
        match reference {
            Some(reference) => self.find_by_reference(&reference).await,
            None => Ok(None),
        }
    }

    async fn save(&self, tx: &Transaction) -> RepositoryResult<()> {
        let record = self
            .record(&tx.reference)
            .await
            .ok_or_else(|| RepositoryError::NotFound(tx.reference.clone()))?;

        let mut stored = record.lock().await;
        if stored.id != tx.id {
            return Err(RepositoryError::NotFound(tx.id.to_string()));
        }
        write_mutable_state(&mut stored, tx);
        Ok(())
    }

    async fn update_by_reference(
        &self,
        reference: &str,
        transition: Transition,
    ) -> RepositoryResult<Option<TransitionRecord>> {
        let Some(record) = self.record(reference).await else {
            return Ok(None);
        };

        let mut stored = record.lock().await;
        let before = stored.clone();
        let next = transition(&before);
        write_mutable_state(&mut stored, &next);

        Ok(Some(TransitionRecord {
            before,
            after: stored.clone(),
        }))
    }

    async fn net_balance(&self, owner: Uuid) -> RepositoryResult<BigDecimal> {
        let records: Vec<_> = self.index.read().await.by_reference.values().cloned().collect();

        let mut total = BigDecimal::from(0);
        for record in records {
            let tx = record.lock().await;
            if tx.owner == owner && tx.status == TransactionStatus::Successful {
                if let Some(native) = tx.native_amount() {
                    total += native;
                }
            }
        }
        Ok(total)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
