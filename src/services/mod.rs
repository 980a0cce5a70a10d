pub mod accounts;
pub mod balances;
pub mod holders;
pub mod statements;
pub mod transactions;

pub use accounts::{AccountError, AccountFilter, AccountService};
pub use balances::BalanceService;
pub use holders::{HolderError, HolderListFilter, HolderService};
pub use statements::{StatementError, StatementService};
pub use transactions::{account_lock_key, TransactionError, TransactionService};
