//! Capability traits for the transaction engine.
//!
//! The transaction service depends on these seams rather than on concrete
//! infrastructure, so tests can substitute in-memory implementations and
//! production wires the Postgres/Redis adapters.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Account, AccountBalance, PendingTransaction, Transaction, TransactionFilter};

/// Failure of an account or balance lookup. `NotFound` is the only variant
/// callers branch on; everything else is carried as `Unavailable`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("account not found")]
    NotFound,

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupted record: {0}")]
    Corrupted(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read access to accounts, as much of them as the transaction engine needs.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn get_by_id(&self, account_id: Uuid) -> Result<Account, GatewayError>;
}

/// Read access to derived account balances. Implementations report an
/// account with no transaction history as balance zero, not as an error.
#[async_trait]
pub trait BalanceGateway: Send + Sync {
    async fn get_by_account_id(&self, account_id: Uuid) -> Result<AccountBalance, GatewayError>;
}

/// Append and lookup of persisted transactions. `create` assigns the record
/// identifier and creation timestamp.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, pending: PendingTransaction) -> RepositoryResult<Transaction>;

    async fn get_by_filter(&self, filter: TransactionFilter) -> RepositoryResult<Vec<Transaction>>;
}

/// Best-effort distributed mutex keyed by an arbitrary string.
///
/// `acquire` returns whether the lock was obtained within `max_retries`
/// attempts; internal errors count as failed attempts. A held lock expires
/// on its own after `lease`, so a crashed holder cannot wedge the key.
/// `release` is idempotent and safe to call without holding the lock:
/// implementations must treat that as a no-op and must never evict a lock
/// they did not grant.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    async fn acquire(&self, key: &str, lease: Duration, max_retries: u32) -> bool;

    async fn release(&self, key: &str);
}
