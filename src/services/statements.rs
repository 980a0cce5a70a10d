//! Statement listings: the transaction history of one account with
//! counterparty names joined in.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{PoolManager, QueryIntent};
use crate::domain::{SortOrder, Statement, StatementAccount, StatementFilter, TransactionKind};

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupted record: {0}")]
    Corrupted(String),
}

const LIST_ASC: &str = r#"
    SELECT t.id AS transaction_id, t.kind, t.amount, t.description, t.created_at,
           t.from_account_id, fa.name AS from_account_name,
           t.to_account_id, ta.name AS to_account_name
    FROM transactions AS t
    LEFT JOIN accounts AS fa ON fa.id = t.from_account_id
    LEFT JOIN accounts AS ta ON ta.id = t.to_account_id
    WHERE (t.from_account_id = $1 OR t.to_account_id = $1)
      AND ($2::timestamptz IS NULL OR t.created_at >= $2)
      AND ($3::timestamptz IS NULL OR t.created_at <= $3)
    ORDER BY t.created_at ASC
    LIMIT $4 OFFSET $5
"#;

const LIST_DESC: &str = r#"
    SELECT t.id AS transaction_id, t.kind, t.amount, t.description, t.created_at,
           t.from_account_id, fa.name AS from_account_name,
           t.to_account_id, ta.name AS to_account_name
    FROM transactions AS t
    LEFT JOIN accounts AS fa ON fa.id = t.from_account_id
    LEFT JOIN accounts AS ta ON ta.id = t.to_account_id
    WHERE (t.from_account_id = $1 OR t.to_account_id = $1)
      AND ($2::timestamptz IS NULL OR t.created_at >= $2)
      AND ($3::timestamptz IS NULL OR t.created_at <= $3)
    ORDER BY t.created_at DESC
    LIMIT $4 OFFSET $5
"#;

const COUNT: &str = r#"
    SELECT COUNT(*) FROM transactions AS t
    WHERE (t.from_account_id = $1 OR t.to_account_id = $1)
      AND ($2::timestamptz IS NULL OR t.created_at >= $2)
      AND ($3::timestamptz IS NULL OR t.created_at <= $3)
"#;

#[derive(Clone)]
pub struct StatementService {
    pools: PoolManager,
}

impl StatementService {
    pub fn new(pools: PoolManager) -> Self {
        Self { pools }
    }

    /// One page of the account's history plus the total number of matching
    /// entries. Both sides of a transfer see the same line.
    pub async fn list(
        &self,
        filter: StatementFilter,
    ) -> Result<(i64, Vec<Statement>), StatementError> {
        let page = filter.page.normalized();
        let pool = self.pools.get_pool(QueryIntent::Read);

        let total = sqlx::query_scalar::<_, i64>(COUNT)
            .bind(filter.account_id)
            .bind(filter.created_at_begin)
            .bind(filter.created_at_end)
            .fetch_one(pool)
            .await?;

        let sql = match filter.sort {
            SortOrder::Asc => LIST_ASC,
            SortOrder::Desc => LIST_DESC,
        };

        let rows = sqlx::query_as::<_, StatementRow>(sql)
            .bind(filter.account_id)
            .bind(filter.created_at_begin)
            .bind(filter.created_at_end)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        let statements = rows
            .into_iter()
            .map(|r| r.into_domain())
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, statements))
    }

    /// The full matching history, ignoring pagination. Backs the export
    /// endpoint.
    pub async fn list_all(&self, filter: &StatementFilter) -> Result<Vec<Statement>, StatementError> {
        let sql = match filter.sort {
            SortOrder::Asc => LIST_ASC,
            SortOrder::Desc => LIST_DESC,
        };

        let rows = sqlx::query_as::<_, StatementRow>(sql)
            .bind(filter.account_id)
            .bind(filter.created_at_begin)
            .bind(filter.created_at_end)
            .bind(i64::MAX)
            .bind(0_i64)
            .fetch_all(self.pools.get_pool(QueryIntent::Read))
            .await?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatementRow {
    transaction_id: Uuid,
    kind: String,
    amount: BigDecimal,
    description: String,
    created_at: DateTime<Utc>,
    from_account_id: Option<Uuid>,
    from_account_name: Option<String>,
    to_account_id: Option<Uuid>,
    to_account_name: Option<String>,
}

impl StatementRow {
    fn into_domain(self) -> Result<Statement, StatementError> {
        let kind = self
            .kind
            .parse::<TransactionKind>()
            .map_err(|err| StatementError::Corrupted(err.to_string()))?;

        Ok(Statement {
            transaction_id: self.transaction_id,
            kind,
            from_account: statement_party(self.from_account_id, self.from_account_name),
            to_account: statement_party(self.to_account_id, self.to_account_name),
            amount: self.amount,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

fn statement_party(id: Option<Uuid>, name: Option<String>) -> Option<StatementAccount> {
    id.map(|id| StatementAccount {
        id,
        name: name.unwrap_or_default(),
    })
}
