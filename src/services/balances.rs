//! Derived account balances: a signed sum over the transaction ledger.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::db::{PoolManager, QueryIntent};
use crate::domain::AccountBalance;
use crate::ports::{BalanceGateway, GatewayError};

#[derive(Clone)]
pub struct BalanceService {
    pools: PoolManager,
}

impl BalanceService {
    pub fn new(pools: PoolManager) -> Self {
        Self { pools }
    }

    /// Current balance of the account: amounts credited into it minus
    /// amounts debited out of it. An account with no transaction history
    /// reads as zero, not as an error.
    ///
    /// Reads go to the primary pool: the debit admission decision depends
    /// on seeing every committed write, which a lagging replica cannot
    /// promise.
    pub async fn get_by_account_id(&self, account_id: Uuid) -> Result<AccountBalance, sqlx::Error> {
        let total = sqlx::query_scalar::<_, Option<BigDecimal>>(
            r#"
            SELECT SUM(entry) FROM (
                SELECT amount AS entry FROM transactions WHERE to_account_id = $1
                UNION ALL
                SELECT -amount AS entry FROM transactions WHERE from_account_id = $1
            ) AS entries
            "#,
        )
        .bind(account_id)
        .fetch_one(self.pools.get_pool(QueryIntent::Write))
        .await?;

        Ok(AccountBalance {
            account_id,
            current_balance: total.unwrap_or_else(|| BigDecimal::from(0)),
        })
    }
}

#[async_trait]
impl BalanceGateway for BalanceService {
    async fn get_by_account_id(&self, account_id: Uuid) -> Result<AccountBalance, GatewayError> {
        BalanceService::get_by_account_id(self, account_id)
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))
    }
}
