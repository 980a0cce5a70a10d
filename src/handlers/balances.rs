use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::AccountBalance;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account_id: Uuid,
    pub current_balance: BigDecimal,
}

impl From<AccountBalance> for BalanceResponse {
    fn from(balance: AccountBalance) -> Self {
        Self {
            account_id: balance.account_id,
            current_balance: balance.current_balance,
        }
    }
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.get_by_id(account_id).await?;
    let balance = state.balances.get_by_account_id(account_id).await?;

    Ok(Json(BalanceResponse::from(balance)))
}
