//! Holder domain entity: the person or company that owns accounts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Holder {
    pub id: Uuid,
    pub name: String,
    /// National document number (CPF/CNPJ style). Unique across holders.
    pub document_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for registering a holder.
#[derive(Debug, Clone)]
pub struct NewHolder {
    pub name: String,
    pub document_number: String,
}
