//! Account domain entity and its lifecycle states.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of an account. Only active accounts may take part in
/// transactions. Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
            AccountStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown account status: {0}")]
pub struct UnknownAccountStatus(pub String);

impl FromStr for AccountStatus {
    type Err = UnknownAccountStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "blocked" => Ok(AccountStatus::Blocked),
            "closed" => Ok(AccountStatus::Closed),
            other => Err(UnknownAccountStatus(other.to_string())),
        }
    }
}

/// Domain entity representing an account owned by a holder.
/// `document_number` is joined in from the owning holder for read models.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub holder_id: Uuid,
    pub name: String,
    pub document_number: String,
    pub agency: String,
    pub number: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for opening an account. The owning holder is referenced by
/// document number and resolved by the service.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub document_number: String,
    pub agency: String,
    pub number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Blocked,
            AccountStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<AccountStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("suspended".parse::<AccountStatus>().is_err());
    }
}
