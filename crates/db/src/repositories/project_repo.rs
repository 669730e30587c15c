//! Repository for the `projects` table.

use siteops_core::status::{DeploymentStatus, ProjectStatus};
use siteops_core::types::{DbId, Timestamp};
use siteops_core::validation::{NewProject, ProjectChanges, Validated};
use sqlx::PgPool;

use crate::models::project::Project;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, status, project_type, account_id, deployment_status, created_at, updated_at";

/// Provides CRUD operations for projects.
///
/// Status changes and deletions go through the lifecycle coordinators,
/// which reach [`ProjectRepo::update_status`] and [`ProjectRepo::delete`]
/// via the Postgres lifecycle store.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Every project starts in `draft`; deployment status defaults to
    /// `not_deployed`.
    pub async fn create(
        pool: &PgPool,
        input: &Validated<NewProject>,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, status, project_type, account_id, deployment_status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.name.trim())
            .bind(ProjectStatus::Draft.as_str())
            .bind(input.project_type.as_str())
            .bind(input.account_id)
            .bind(input.deployment_status.unwrap_or_default().as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Update a project's non-status fields. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &Validated<ProjectChanges>,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                name = COALESCE($2, name),
                project_type = COALESCE($3, project_type),
                account_id = COALESCE($4, account_id),
                deployment_status = COALESCE($5, deployment_status),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.project_type.map(|t| t.as_str()))
            .bind(input.account_id)
            .bind(input.deployment_status.map(DeploymentStatus::as_str))
            .fetch_optional(pool)
            .await
    }

    /// Read only the persisted status string.
    pub async fn read_status(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT status FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write a new status and updated-at stamp. Returns `true` if a row changed.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        updated_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE projects SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(updated_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a project by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
