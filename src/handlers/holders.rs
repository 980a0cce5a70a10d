use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Holder, NewHolder, PageRequest, SortOrder};
use crate::error::AppError;
use crate::services::HolderListFilter;
use crate::validation::{sanitize_string, validate_document_number, validate_name};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateHolderRequest {
    pub name: String,
    pub document_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListHoldersQuery {
    pub document_number: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct HolderResponse {
    pub id: Uuid,
    pub name: String,
    pub document_number: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Holder> for HolderResponse {
    fn from(holder: Holder) -> Self {
        Self {
            id: holder.id,
            name: holder.name,
            document_number: holder.document_number,
            created_at: holder.created_at,
            updated_at: holder.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HolderListResponse {
    pub total: i64,
    pub holders: Vec<HolderResponse>,
}

pub async fn create_holder(
    State(state): State<AppState>,
    Json(payload): Json<CreateHolderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = sanitize_string(&payload.name);
    let document_number = sanitize_string(&payload.document_number);
    validate_name(&name)?;
    validate_document_number(&document_number)?;

    let holder = state
        .holders
        .create(NewHolder {
            name,
            document_number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(HolderResponse::from(holder))))
}

pub async fn get_holder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let holder = state.holders.get_by_id(id).await?;

    Ok(Json(HolderResponse::from(holder)))
}

pub async fn list_holders(
    State(state): State<AppState>,
    Query(query): Query<ListHoldersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = HolderListFilter {
        document_number: query.document_number.map(|d| sanitize_string(&d)),
        page: PageRequest {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        },
        sort: query.sort.unwrap_or_default(),
    };

    let (total, holders) = state.holders.list(filter).await?;

    Ok(Json(HolderListResponse {
        total,
        holders: holders.into_iter().map(HolderResponse::from).collect(),
    }))
}
