use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, AccountStatus, NewAccount};
use crate::error::AppError;
use crate::services::AccountFilter;
use crate::validation::{
    sanitize_string, validate_account_number, validate_agency, validate_document_number,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub document_number: String,
    pub agency: String,
    pub number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    pub name: Option<String>,
    pub document_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub holder_id: Uuid,
    pub name: String,
    pub document_number: String,
    pub agency: String,
    pub number: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            holder_id: account.holder_id,
            name: account.name,
            document_number: account.document_number,
            agency: account.agency,
            number: account.number,
            status: account.status,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document_number = sanitize_string(&payload.document_number);
    let agency = sanitize_string(&payload.agency);
    let number = sanitize_string(&payload.number);
    validate_document_number(&document_number)?;
    validate_agency(&agency)?;
    validate_account_number(&number)?;

    let account = state
        .accounts
        .create(NewAccount {
            document_number,
            agency,
            number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.get_by_id(id).await?;

    Ok(Json(AccountResponse::from(account)))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = AccountFilter {
        name: query.name.map(|n| sanitize_string(&n)),
        document_number: query.document_number.map(|d| sanitize_string(&d)),
    };

    let accounts = state.accounts.list(filter).await?;

    Ok(Json(
        accounts
            .into_iter()
            .map(AccountResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn block_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.block_by_id(id).await?;

    Ok(Json(AccountResponse::from(account)))
}

pub async fn unblock_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.unblock_by_id(id).await?;

    Ok(Json(AccountResponse::from(account)))
}

pub async fn close_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.close_by_id(id).await?;

    Ok(Json(AccountResponse::from(account)))
}
