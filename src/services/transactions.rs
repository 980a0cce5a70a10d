//! Transaction engine: classification, participant validation, balance
//! admission and persistence of credits, debits and transfers.
//!
//! Every balance-decreasing path (debit, p2p) serializes on a per-account
//! distributed lock before re-reading the balance, so two concurrent debits
//! cannot both be admitted against the same funds. Credits append without
//! locking. The lock is released exactly once on every exit of the debit
//! path, acquisition failure included; if a caller is cancelled mid-flight
//! the lease TTL frees the key on its own.

use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    AccountStatus, NewTransaction, PendingTransaction, Transaction, TransactionFilter,
    TransactionKind,
};
use crate::ports::{
    AccountGateway, BalanceGateway, DistributedLock, GatewayError, RepositoryError,
    TransactionRepository,
};

const ACCOUNT_LOCK_LEASE: Duration = Duration::from_millis(50);
const ACCOUNT_LOCK_RETRIES: u32 = 3;

/// Lock key protecting the debited account. Keyed by business identity so
/// every writer that decreases this account's balance contends on the same
/// key, whatever connection or process it runs on.
pub fn account_lock_key(account_id: Uuid) -> String {
    format!("transaction-account-from-{account_id}")
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("no transaction found with these filters")]
    NotFound,

    #[error("multiple transactions found with these filters")]
    MultipleFound,

    #[error("the from account and to account must be different")]
    FromToAccountsEqual,

    #[error("the from account could not be found")]
    FromAccountNotFound,

    #[error("the to account could not be found")]
    ToAccountNotFound,

    #[error("accounts involved in a transaction must be active")]
    AccountInactive,

    #[error("was not possible to lock the account to process the operation")]
    AccountLockFailed,

    #[error("received an error when reading the account balance")]
    BalanceUnavailable,

    #[error("insufficient funds to complete the transaction")]
    InsufficientFunds,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrates transaction creation and lookup over the four capability
/// seams. Construct one per process and clone it freely.
#[derive(Clone)]
pub struct TransactionService {
    repository: Arc<dyn TransactionRepository>,
    locker: Arc<dyn DistributedLock>,
    accounts: Arc<dyn AccountGateway>,
    balances: Arc<dyn BalanceGateway>,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        locker: Arc<dyn DistributedLock>,
        accounts: Arc<dyn AccountGateway>,
        balances: Arc<dyn BalanceGateway>,
    ) -> Self {
        Self {
            repository,
            locker,
            accounts,
            balances,
        }
    }

    /// Records money entering the ledger into `to`. Credits never contend
    /// for the account lock: they only grow the balance and cannot create
    /// an overdraft.
    pub async fn create_credit(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, TransactionError> {
        let to = transaction
            .to
            .ok_or(TransactionError::ToAccountNotFound)?;

        self.check_account(to, TransactionError::ToAccountNotFound)
            .await?;

        self.persist(transaction.with_kind(TransactionKind::Credit))
            .await
    }

    /// Records money leaving the ledger from `from`, admitted only while
    /// the account's balance covers it.
    pub async fn create_debit(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, TransactionError> {
        let from = transaction
            .from
            .ok_or(TransactionError::FromAccountNotFound)?;

        self.check_account(from, TransactionError::FromAccountNotFound)
            .await?;

        self.create_debited(from, transaction.with_kind(TransactionKind::Debit))
            .await
    }

    /// Records a transfer between two ledger accounts. Equal endpoints are
    /// rejected before any account is looked up. The source side goes
    /// through the same locked admission as a debit.
    pub async fn create_p2p(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, TransactionError> {
        if transaction.from.is_some() && transaction.from == transaction.to {
            tracing::error!(
                from = ?transaction.from,
                to = ?transaction.to,
                "p2p transaction with identical endpoints rejected"
            );
            return Err(TransactionError::FromToAccountsEqual);
        }

        let from = transaction
            .from
            .ok_or(TransactionError::FromAccountNotFound)?;
        let to = transaction.to.ok_or(TransactionError::ToAccountNotFound)?;

        self.check_account(from, TransactionError::FromAccountNotFound)
            .await?;
        self.check_account(to, TransactionError::ToAccountNotFound)
            .await?;

        self.create_debited(from, transaction.with_kind(TransactionKind::P2p))
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Transaction, TransactionError> {
        let mut records = self
            .repository
            .get_by_filter(TransactionFilter::by_id(id))
            .await
            .map_err(|err| {
                tracing::error!(transaction_id = %id, error = %err, "transaction lookup failed");
                TransactionError::Repository(err)
            })?;

        match records.len() {
            0 => Err(TransactionError::NotFound),
            1 => Ok(records.remove(0)),
            _ => Err(TransactionError::MultipleFound),
        }
    }

    /// Validates that the account exists and is active. Any lookup failure,
    /// "not found" or otherwise, surfaces as the caller's `not_found` kind;
    /// unexpected causes are logged before being folded in.
    async fn check_account(
        &self,
        account_id: Uuid,
        not_found: TransactionError,
    ) -> Result<(), TransactionError> {
        let account = match self.accounts.get_by_id(account_id).await {
            Ok(account) => account,
            Err(GatewayError::NotFound) => return Err(not_found),
            Err(err) => {
                tracing::error!(%account_id, error = %err, "account check failed");
                return Err(not_found);
            }
        };

        if account.status != AccountStatus::Active {
            tracing::error!(%account_id, status = %account.status, "inactive account in transaction");
            return Err(TransactionError::AccountInactive);
        }

        Ok(())
    }

    /// The locked admission path shared by debits and transfers.
    ///
    /// Release is unconditional: it runs exactly once whether acquisition
    /// failed, the balance read errored, admission was refused, persistence
    /// failed, or the record was written. Lock implementations treat a
    /// release without ownership as a no-op, so the failed-acquisition
    /// release can never evict whoever actually holds the key.
    async fn create_debited(
        &self,
        from: Uuid,
        pending: PendingTransaction,
    ) -> Result<Transaction, TransactionError> {
        let lock_key = account_lock_key(from);

        let result = if self
            .locker
            .acquire(&lock_key, ACCOUNT_LOCK_LEASE, ACCOUNT_LOCK_RETRIES)
            .await
        {
            self.admit_and_persist(from, pending).await
        } else {
            Err(TransactionError::AccountLockFailed)
        };

        self.locker.release(&lock_key).await;
        result
    }

    /// Runs under the account lock: re-reads the balance and admits the
    /// movement only if it cannot take the account below zero.
    async fn admit_and_persist(
        &self,
        from: Uuid,
        pending: PendingTransaction,
    ) -> Result<Transaction, TransactionError> {
        let balance = self
            .balances
            .get_by_account_id(from)
            .await
            .map_err(|err| {
                tracing::error!(account_id = %from, error = %err, "balance read failed");
                TransactionError::BalanceUnavailable
            })?;

        let projected = &balance.current_balance - &pending.amount;
        if projected < BigDecimal::from(0) {
            return Err(TransactionError::InsufficientFunds);
        }

        self.persist(pending).await
    }

    async fn persist(&self, pending: PendingTransaction) -> Result<Transaction, TransactionError> {
        self.repository.create(pending).await.map_err(|err| {
            tracing::error!(error = %err, "transaction persistence failed");
            TransactionError::Repository(err)
        })
    }
}
