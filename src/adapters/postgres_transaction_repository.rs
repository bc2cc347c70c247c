//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{Transaction, TransactionDraft};
use crate::ports::{
    RepositoryError, RepositoryResult, TransactionRepository, Transition, TransitionRecord,
};

const COLUMNS: &str = "id, reference, amount, amount_paid, intent, transaction_type, provider, \
                       status, owner_id, raw, created_at, updated_at";

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(err: sqlx::Error, reference: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::DuplicateReference(reference.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

/// Writes the mutable columns. `native_amount` is stored so balances can be summed in SQL.
async fn write_mutable_state(
    conn: &mut PgConnection,
    tx: &Transaction,
) -> RepositoryResult<Option<Transaction>> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        UPDATE transactions
        SET status = $2, amount_paid = $3, native_amount = $4, raw = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(tx.id)
    .bind(tx.status.as_str())
    .bind(&tx.amount_paid)
    .bind(tx.native_amount())
    .bind(&tx.raw)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(TransactionRow::into_domain).transpose()
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, draft: TransactionDraft) -> RepositoryResult<Transaction> {
        let tx = Transaction::open(draft);

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (
                id, reference, amount, amount_paid, native_amount, intent, transaction_type,
                provider, status, owner_id, raw, created_at, updated_at
            ) VALUES ($1, $2, $3, NULL, NULL, $4, $5, $6, $7, $8, NULL, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(tx.id)
        .bind(&tx.reference)
        .bind(&tx.amount)
        .bind(tx.intent.as_str())
        .bind(tx.transaction_type.as_str())
        .bind(tx.provider.as_str())
        .bind(tx.status.as_str())
        .bind(tx.owner)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &tx.reference))?;

        row.into_domain()
    }

    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn save(&self, tx: &Transaction) -> RepositoryResult<()> {
        let mut conn = self.pool.acquire().await?;
        match write_mutable_state(&mut *conn, tx).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound(tx.id.to_string())),
        }
    }

    async fn update_by_reference(
        &self,
        reference: &str,
        transition: Transition,
    ) -> RepositoryResult<Option<TransitionRecord>> {
        let mut db_tx = self.pool.begin().await?;

        // Row lock held until commit; concurrent deliveries for the same reference queue here.
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *db_tx)
        .await?;

        let Some(row) = row else {
            db_tx.rollback().await?;
            return Ok(None);
        };

        let before = row.into_domain()?;
        let next = transition(&before);
        let after = write_mutable_state(&mut *db_tx, &next)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(reference.to_string()))?;

        db_tx.commit().await?;
        Ok(Some(TransitionRecord { before, after }))
    }

    async fn net_balance(&self, owner: Uuid) -> RepositoryResult<BigDecimal> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(native_amount) FROM transactions
            WHERE owner_id = $1 AND status = 'SUCCESSFUL'
            "#,
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or_else(|| BigDecimal::from(0)))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    reference: String,
    amount: BigDecimal,
    amount_paid: Option<BigDecimal>,
    intent: String,
    transaction_type: String,
    provider: String,
    status: String,
    owner_id: Uuid,
    raw: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let corrupt = |e: crate::domain::transaction::UnknownVariant| {
            RepositoryError::Corrupt(format!("{}: {}", self.id, e))
        };

        Ok(Transaction {
            intent: self.intent.parse().map_err(corrupt)?,
            transaction_type: self.transaction_type.parse().map_err(corrupt)?,
            provider: self.provider.parse().map_err(corrupt)?,
            status: self.status.parse().map_err(corrupt)?,
            id: self.id,
            reference: self.reference,
            amount: self.amount,
            amount_paid: self.amount_paid,
            owner: self.owner_id,
            raw: self.raw,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
