//! Transaction domain entities.
//! A transaction is an append-only record of money moving into, out of,
//! or between accounts.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// How a transaction moves money. The kind is assigned by the service
/// entrypoint that accepted the request, never inferred from which
/// participants happen to be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money enters the ledger from outside. Only `to` is set.
    Credit,
    /// Money leaves the ledger. Only `from` is set.
    Debit,
    /// Money moves between two ledger accounts. Both sides are set.
    P2p,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
            TransactionKind::P2p => "p2p",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown transaction kind: {0}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            "p2p" => Ok(TransactionKind::P2p),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

/// Caller-supplied draft of a transaction. Carries no kind and no identity:
/// the kind comes from the service entrypoint, the id and timestamp from the
/// repository at persistence time.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
    pub amount: BigDecimal,
    pub description: String,
}

impl NewTransaction {
    pub(crate) fn with_kind(self, kind: TransactionKind) -> PendingTransaction {
        PendingTransaction {
            kind,
            from: self.from,
            to: self.to,
            amount: self.amount,
            description: self.description,
        }
    }
}

/// A classified transaction awaiting persistence.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub kind: TransactionKind,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
    pub amount: BigDecimal,
    pub description: String,
}

/// A persisted ledger record. Immutable once written.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
    pub amount: BigDecimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Predicates understood by `TransactionRepository::get_by_filter`.
/// Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub id: Option<Uuid>,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
}

impl TransactionFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}
