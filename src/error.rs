use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AccountError, HolderError, StatementError, TransactionError};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        let message = err.to_string();
        match err {
            TransactionError::NotFound => AppError::NotFound(message),
            TransactionError::FromAccountNotFound
            | TransactionError::ToAccountNotFound
            | TransactionError::AccountInactive => AppError::BadRequest(message),
            TransactionError::FromToAccountsEqual => AppError::Unprocessable(message),
            TransactionError::InsufficientFunds => AppError::PreconditionFailed(message),
            TransactionError::AccountLockFailed => AppError::Conflict(message),
            TransactionError::MultipleFound
            | TransactionError::BalanceUnavailable
            | TransactionError::Repository(_) => AppError::Internal(message),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::NotFound => AppError::NotFound(message),
            AccountError::HolderNotFound => AppError::BadRequest(message),
            AccountError::InvalidStatusTransition { .. } => AppError::Unprocessable(message),
            AccountError::Database(_) | AccountError::Corrupted(_) => AppError::Internal(message),
        }
    }
}

impl From<HolderError> for AppError {
    fn from(err: HolderError) -> Self {
        let message = err.to_string();
        match err {
            HolderError::NotFound => AppError::NotFound(message),
            HolderError::DocumentTaken => AppError::Conflict(message),
            HolderError::Database(_) => AppError::Internal(message),
        }
    }
}

impl From<StatementError> for AppError {
    fn from(err: StatementError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}
