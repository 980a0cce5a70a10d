use axum::{
    extract::{Path, Query, State},
    http::{header, header::HeaderValue, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    PageRequest, SortOrder, Statement, StatementAccount, StatementFilter, TransactionKind,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListStatementsQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<SortOrder>,
    /// Inclusive lower bound, YYYY-MM-DD or RFC 3339.
    pub created_at_begin: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD or RFC 3339.
    pub created_at_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportStatementsQuery {
    /// Export format: "csv" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    pub sort: Option<SortOrder>,
    pub created_at_begin: Option<String>,
    pub created_at_end: Option<String>,
}

fn default_format() -> String {
    "csv".to_string()
}

#[derive(Debug, Serialize)]
pub struct StatementAccountResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<StatementAccount> for StatementAccountResponse {
    fn from(account: StatementAccount) -> Self {
        Self {
            id: account.id,
            name: account.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub transaction_id: Uuid,
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<StatementAccountResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<StatementAccountResponse>,
    pub amount: BigDecimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<Statement> for StatementResponse {
    fn from(statement: Statement) -> Self {
        Self {
            transaction_id: statement.transaction_id,
            kind: statement.kind,
            from_account: statement.from_account.map(StatementAccountResponse::from),
            to_account: statement.to_account.map(StatementAccountResponse::from),
            amount: statement.amount,
            description: statement.description,
            created_at: statement.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementListResponse {
    pub total: i64,
    pub statements: Vec<StatementResponse>,
}

/// CSV line for one statement entry. Everything is a string so absent
/// sides export as empty cells.
#[derive(Serialize)]
struct StatementCsvRow {
    transaction_id: String,
    kind: String,
    from_account_id: String,
    from_account_name: String,
    to_account_id: String,
    to_account_name: String,
    amount: String,
    description: String,
    created_at: String,
}

impl From<&Statement> for StatementCsvRow {
    fn from(statement: &Statement) -> Self {
        StatementCsvRow {
            transaction_id: statement.transaction_id.to_string(),
            kind: statement.kind.to_string(),
            from_account_id: statement
                .from_account
                .as_ref()
                .map(|a| a.id.to_string())
                .unwrap_or_default(),
            from_account_name: statement
                .from_account
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            to_account_id: statement
                .to_account
                .as_ref()
                .map(|a| a.id.to_string())
                .unwrap_or_default(),
            to_account_name: statement
                .to_account
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            amount: statement.amount.to_string(),
            description: statement.description.clone(),
            created_at: statement.created_at.to_rfc3339(),
        }
    }
}

/// Parses YYYY-MM-DD as midnight UTC and anything longer as RFC 3339.
fn parse_date(date_str: &str) -> Result<DateTime<Utc>, AppError> {
    let date_str = if date_str.len() == 10 {
        format!("{}T00:00:00Z", date_str)
    } else {
        date_str.to_string()
    };

    DateTime::parse_from_rfc3339(&date_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("invalid date format: {}", e)))
}

fn parse_date_bound(bound: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    bound.as_deref().map(parse_date).transpose()
}

pub async fn list_statements(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<ListStatementsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.get_by_id(account_id).await?;

    let filter = StatementFilter {
        account_id,
        page: PageRequest {
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        },
        sort: query.sort.unwrap_or_default(),
        created_at_begin: parse_date_bound(query.created_at_begin)?,
        created_at_end: parse_date_bound(query.created_at_end)?,
    };

    let (total, statements) = state.statements.list(filter).await?;

    Ok(Json(StatementListResponse {
        total,
        statements: statements.into_iter().map(StatementResponse::from).collect(),
    }))
}

pub async fn export_statements(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<ExportStatementsQuery>,
) -> Result<Response, AppError> {
    state.accounts.get_by_id(account_id).await?;

    let filter = StatementFilter {
        account_id,
        page: PageRequest::default(),
        sort: query.sort.unwrap_or_default(),
        created_at_begin: parse_date_bound(query.created_at_begin)?,
        created_at_end: parse_date_bound(query.created_at_end)?,
    };

    let statements = state.statements.list_all(&filter).await?;

    match query.format.to_lowercase().as_str() {
        "json" => {
            let filename = format!("statements_{}_{}.json", account_id, Utc::now().format("%Y-%m-%d"));
            let rows = statements
                .into_iter()
                .map(StatementResponse::from)
                .collect::<Vec<_>>();

            Ok((attachment_headers(&filename), Json(rows)).into_response())
        }
        _ => {
            let filename = format!("statements_{}_{}.csv", account_id, Utc::now().format("%Y-%m-%d"));
            let mut wtr = Writer::from_writer(vec![]);
            for statement in &statements {
                wtr.serialize(StatementCsvRow::from(statement))
                    .map_err(|e| AppError::Internal(e.to_string()))?;
            }
            let bytes = wtr
                .into_inner()
                .map_err(|e| AppError::Internal(e.to_string()))?;

            let mut headers = attachment_headers(&filename);
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));

            Ok((headers, bytes).into_response())
        }
    }
}

fn attachment_headers(filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    headers
}
