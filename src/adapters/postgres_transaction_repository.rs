//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::{PoolManager, QueryIntent};
use crate::domain::{PendingTransaction, Transaction, TransactionFilter, TransactionKind};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

/// Postgres-backed transaction repository. Inserts go to the primary pool;
/// filtered reads may be served by the replica.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pools: PoolManager,
}

impl PostgresTransactionRepository {
    pub fn new(pools: PoolManager) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, pending: PendingTransaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, kind, from_account_id, to_account_id, amount, description, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, kind, from_account_id, to_account_id, amount, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pending.kind.as_str())
        .bind(pending.from)
        .bind(pending.to)
        .bind(&pending.amount)
        .bind(&pending.description)
        .bind(Utc::now())
        .fetch_one(self.pools.get_pool(QueryIntent::Write))
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn get_by_filter(&self, filter: TransactionFilter) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, kind, from_account_id, to_account_id, amount, description, created_at
            FROM transactions
            WHERE ($1::uuid IS NULL OR id = $1)
              AND ($2::uuid IS NULL OR from_account_id = $2)
              AND ($3::uuid IS NULL OR to_account_id = $3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(filter.id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(self.pools.get_pool(QueryIntent::Read))
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    kind: String,
    from_account_id: Option<Uuid>,
    to_account_id: Option<Uuid>,
    amount: bigdecimal::BigDecimal,
    description: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let kind = self
            .kind
            .parse::<TransactionKind>()
            .map_err(|err| RepositoryError::Corrupted(err.to_string()))?;

        Ok(Transaction {
            id: self.id,
            kind,
            from: self.from_account_id,
            to: self.to_account_id,
            amount: self.amount,
            description: self.description,
            created_at: self.created_at,
        })
    }
}
