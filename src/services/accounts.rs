//! Account management: opening accounts for holders and driving the
//! account lifecycle (active, blocked, closed).

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{PoolManager, QueryIntent};
use crate::domain::{Account, AccountStatus, NewAccount};
use crate::ports::{AccountGateway, GatewayError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("no account found with this identifier")]
    NotFound,

    #[error("no holder found with this document number")]
    HolderNotFound,

    #[error("account status cannot change from {from} to {to}")]
    InvalidStatusTransition {
        from: AccountStatus,
        to: AccountStatus,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// Filter for account listings. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub name: Option<String>,
    pub document_number: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    pools: PoolManager,
}

impl AccountService {
    pub fn new(pools: PoolManager) -> Self {
        Self { pools }
    }

    /// Opens an account for the holder with the given document number.
    /// The account starts active and carries the holder's name.
    pub async fn create(&self, account: NewAccount) -> Result<Account, AccountError> {
        let holder = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM holders WHERE document_number = $1",
        )
        .bind(&account.document_number)
        .fetch_optional(self.pools.get_pool(QueryIntent::Read))
        .await?
        .ok_or(AccountError::HolderNotFound)?;

        let (holder_id, holder_name) = holder;
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, holder_id, name, agency, number, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(holder_id)
        .bind(&holder_name)
        .bind(&account.agency)
        .bind(&account.number)
        .bind(AccountStatus::Active.as_str())
        .bind(created_at)
        .execute(self.pools.get_pool(QueryIntent::Write))
        .await?;

        Ok(Account {
            id,
            holder_id,
            name: holder_name,
            document_number: account.document_number,
            agency: account.agency,
            number: account.number,
            status: AccountStatus::Active,
            created_at,
            updated_at: None,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT a.id, a.holder_id, a.name, h.document_number, a.agency, a.number,
                   a.status, a.created_at, a.updated_at
            FROM accounts AS a
            JOIN holders AS h ON h.id = a.holder_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pools.get_pool(QueryIntent::Read))
        .await?;

        row.ok_or(AccountError::NotFound)?.into_domain()
    }

    pub async fn list(&self, filter: AccountFilter) -> Result<Vec<Account>, AccountError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT a.id, a.holder_id, a.name, h.document_number, a.agency, a.number,
                   a.status, a.created_at, a.updated_at
            FROM accounts AS a
            JOIN holders AS h ON h.id = a.holder_id
            WHERE ($1::text IS NULL OR a.name = $1)
              AND ($2::text IS NULL OR h.document_number = $2)
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(filter.name.as_deref())
        .bind(filter.document_number.as_deref())
        .fetch_all(self.pools.get_pool(QueryIntent::Read))
        .await?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }

    pub async fn block_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        self.transition(id, &[AccountStatus::Active], AccountStatus::Blocked)
            .await
    }

    pub async fn unblock_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        self.transition(id, &[AccountStatus::Blocked], AccountStatus::Active)
            .await
    }

    /// Closing is terminal: a closed account can never be reopened.
    pub async fn close_by_id(&self, id: Uuid) -> Result<Account, AccountError> {
        self.transition(
            id,
            &[AccountStatus::Active, AccountStatus::Blocked],
            AccountStatus::Closed,
        )
        .await
    }

    async fn transition(
        &self,
        id: Uuid,
        allowed_from: &[AccountStatus],
        to: AccountStatus,
    ) -> Result<Account, AccountError> {
        let account = self.get_by_id(id).await?;

        if !allowed_from.contains(&account.status) {
            return Err(AccountError::InvalidStatusTransition {
                from: account.status,
                to,
            });
        }

        let updated_at = Utc::now();
        sqlx::query("UPDATE accounts SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(to.as_str())
            .bind(updated_at)
            .execute(self.pools.get_pool(QueryIntent::Write))
            .await?;

        tracing::info!(account_id = %id, from = %account.status, to = %to, "account status changed");

        Ok(Account {
            status: to,
            updated_at: Some(updated_at),
            ..account
        })
    }
}

#[async_trait]
impl AccountGateway for AccountService {
    async fn get_by_id(&self, account_id: Uuid) -> Result<Account, GatewayError> {
        match AccountService::get_by_id(self, account_id).await {
            Ok(account) => Ok(account),
            Err(AccountError::NotFound) => Err(GatewayError::NotFound),
            Err(err) => Err(GatewayError::Unavailable(err.to_string())),
        }
    }
}

/// Internal row type for SQLx. Not exposed outside the service.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    holder_id: Uuid,
    name: String,
    document_number: String,
    agency: String,
    number: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AccountRow {
    fn into_domain(self) -> Result<Account, AccountError> {
        let status = self
            .status
            .parse::<AccountStatus>()
            .map_err(|err| AccountError::Corrupted(err.to_string()))?;

        Ok(Account {
            id: self.id,
            holder_id: self.holder_id,
            name: self.name,
            document_number: self.document_number,
            agency: self.agency,
            number: self.number,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
