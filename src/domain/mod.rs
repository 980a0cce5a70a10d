//! Domain entities and value types.
//! Framework-agnostic: nothing in here knows about HTTP, SQL or Redis.

pub mod account;
pub mod balance;
pub mod holder;
pub mod statement;
pub mod transaction;

pub use account::{Account, AccountStatus, NewAccount, UnknownAccountStatus};
pub use balance::AccountBalance;
pub use holder::{Holder, NewHolder};
pub use statement::{Statement, StatementAccount, StatementFilter};
pub use transaction::{
    NewTransaction, PendingTransaction, Transaction, TransactionFilter, TransactionKind,
    UnknownTransactionKind,
};

use serde::Deserialize;

/// Sort direction for listing endpoints. Listings are ordered by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Page/size pair for paginated listings. Page numbering starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

impl PageRequest {
    /// Clamps out-of-range values to the defaults instead of erroring,
    /// mirroring how the listing endpoints have always behaved.
    pub fn normalized(self) -> Self {
        Self {
            page: if self.page < 1 { 1 } else { self.page },
            size: if self.size < 1 { 20 } else { self.size },
        }
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.size
    }
}
