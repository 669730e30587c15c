//! Project entity model.

use serde::Serialize;
use siteops_core::status::{ProjectStatus, ProjectType};
use siteops_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub status: String,
    pub project_type: String,
    pub account_id: Option<DbId>,
    pub deployment_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> Result<ProjectStatus, String> {
        ProjectStatus::from_str_value(&self.status)
    }

    pub fn project_type(&self) -> Result<ProjectType, String> {
        ProjectType::from_str_value(&self.project_type)
    }
}
