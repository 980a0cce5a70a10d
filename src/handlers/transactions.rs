use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{NewTransaction, Transaction, TransactionKind};
use crate::error::AppError;
use crate::validation::{sanitize_string, validate_description, validate_positive_amount};
use crate::AppState;

/// Shared payload for the three creation endpoints. The endpoint, not the
/// payload, decides the transaction kind; each one requires the sides it
/// needs and ignores none.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: BigDecimal,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            kind: transaction.kind,
            from_account_id: transaction.from,
            to_account_id: transaction.to,
            amount: transaction.amount,
            description: transaction.description,
            created_at: transaction.created_at,
        }
    }
}

fn new_transaction(payload: CreateTransactionRequest) -> Result<NewTransaction, AppError> {
    validate_positive_amount(&payload.amount)?;
    let description = sanitize_string(&payload.description);
    validate_description(&description)?;

    Ok(NewTransaction {
        from: payload.from_account_id,
        to: payload.to_account_id,
        amount: payload.amount,
        description,
    })
}

pub async fn create_credit(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .transactions
        .create_credit(new_transaction(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(transaction))))
}

pub async fn create_debit(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .transactions
        .create_debit(new_transaction(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(transaction))))
}

pub async fn create_p2p(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .transactions
        .create_p2p(new_transaction(payload)?)
        .await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(transaction))))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state.transactions.get_by_id(id).await?;

    Ok(Json(TransactionResponse::from(transaction)))
}
