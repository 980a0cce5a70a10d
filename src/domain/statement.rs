//! Statement read model: the transaction history of one account with
//! counterparty names joined in.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::transaction::TransactionKind;
use super::{PageRequest, SortOrder};

/// One statement line. Either side is absent when the transaction had no
/// account on that side (credits have no `from`, debits no `to`).
#[derive(Debug, Clone)]
pub struct Statement {
    pub transaction_id: Uuid,
    pub kind: TransactionKind,
    pub from_account: Option<StatementAccount>,
    pub to_account: Option<StatementAccount>,
    pub amount: BigDecimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StatementAccount {
    pub id: Uuid,
    pub name: String,
}

/// Filter for statement listings. The account is mandatory; the date range
/// bounds are inclusive and optional.
#[derive(Debug, Clone)]
pub struct StatementFilter {
    pub account_id: Uuid,
    pub page: PageRequest,
    pub sort: SortOrder,
    pub created_at_begin: Option<DateTime<Utc>>,
    pub created_at_end: Option<DateTime<Utc>>,
}
