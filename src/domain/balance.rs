//! Account balance read model.

use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Current balance of an account, derived from the transaction ledger:
/// the sum of amounts credited into the account minus the sum of amounts
/// debited out of it. An account with no history has a balance of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account_id: Uuid,
    pub current_balance: BigDecimal,
}
