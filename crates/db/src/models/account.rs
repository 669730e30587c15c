//! Account entity model.

use serde::Serialize;
use siteops_core::status::AccountStatus;
use siteops_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// An account row from the `accounts` table, with its derived project count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub business_name: String,
    pub email: String,
    pub status: String,
    pub domain: Option<String>,
    pub notes: Option<String>,
    /// Set when the account last became a customer.
    pub converted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Computed on read; not a stored column.
    pub project_count: i64,
}

impl Account {
    pub fn status(&self) -> Result<AccountStatus, String> {
        AccountStatus::from_str_value(&self.status)
    }
}
