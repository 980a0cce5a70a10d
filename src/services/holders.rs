//! Holder management: the people and companies that own accounts.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{PoolManager, QueryIntent};
use crate::domain::{Holder, NewHolder, PageRequest, SortOrder};

#[derive(Debug, Error)]
pub enum HolderError {
    #[error("no holder found with this identifier")]
    NotFound,

    #[error("a holder with this document number already exists")]
    DocumentTaken,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Filter for holder listings.
#[derive(Debug, Clone, Default)]
pub struct HolderListFilter {
    pub document_number: Option<String>,
    pub page: PageRequest,
    pub sort: SortOrder,
}

#[derive(Clone)]
pub struct HolderService {
    pools: PoolManager,
}

impl HolderService {
    pub fn new(pools: PoolManager) -> Self {
        Self { pools }
    }

    pub async fn create(&self, holder: NewHolder) -> Result<Holder, HolderError> {
        let row = sqlx::query_as::<_, HolderRow>(
            r#"
            INSERT INTO holders (id, name, document_number, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, document_number, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&holder.name)
        .bind(&holder.document_number)
        .bind(Utc::now())
        .fetch_one(self.pools.get_pool(QueryIntent::Write))
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                HolderError::DocumentTaken
            } else {
                tracing::error!(error = %err, "holder insert failed");
                HolderError::Database(err)
            }
        })?;

        Ok(row.into_domain())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Holder, HolderError> {
        let row = sqlx::query_as::<_, HolderRow>(
            "SELECT id, name, document_number, created_at, updated_at FROM holders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pools.get_pool(QueryIntent::Read))
        .await?;

        row.map(|r| r.into_domain()).ok_or(HolderError::NotFound)
    }

    /// Paginated listing ordered by creation time, optionally narrowed to
    /// one document number. Returns the total row count alongside the page.
    pub async fn list(&self, filter: HolderListFilter) -> Result<(i64, Vec<Holder>), HolderError> {
        let page = filter.page.normalized();
        let pool = self.pools.get_pool(QueryIntent::Read);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM holders WHERE ($1::text IS NULL OR document_number = $1)",
        )
        .bind(filter.document_number.as_deref())
        .fetch_one(pool)
        .await?;

        let sql = match filter.sort {
            SortOrder::Asc => {
                r#"
                SELECT id, name, document_number, created_at, updated_at FROM holders
                WHERE ($1::text IS NULL OR document_number = $1)
                ORDER BY created_at ASC
                LIMIT $2 OFFSET $3
                "#
            }
            SortOrder::Desc => {
                r#"
                SELECT id, name, document_number, created_at, updated_at FROM holders
                WHERE ($1::text IS NULL OR document_number = $1)
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#
            }
        };

        let rows = sqlx::query_as::<_, HolderRow>(sql)
            .bind(filter.document_number.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((total, rows.into_iter().map(|r| r.into_domain()).collect()))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug, sqlx::FromRow)]
struct HolderRow {
    id: Uuid,
    name: String,
    document_number: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl HolderRow {
    fn into_domain(self) -> Holder {
        Holder {
            id: self.id,
            name: self.name,
            document_number: self.document_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
