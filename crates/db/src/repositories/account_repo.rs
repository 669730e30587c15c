//! Repository for the `accounts` table.

use siteops_core::types::{DbId, Timestamp};
use siteops_core::validation::{AccountChanges, ClearableField, NewAccount, Validated};
use sqlx::PgPool;

use crate::models::account::Account;

/// Column list shared across queries, including the derived project count.
const COLUMNS: &str = "\
    id, business_name, email, status, domain, notes, converted_at, \
    created_at, updated_at, \
    (SELECT COUNT(*) FROM projects p WHERE p.account_id = accounts.id) AS project_count";

/// Provides CRUD operations for accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account, returning the created row.
    ///
    /// Status defaults to `prospect`. An account created directly as a
    /// customer gets `converted_at` stamped on insert.
    pub async fn create(
        pool: &PgPool,
        input: &Validated<NewAccount>,
    ) -> Result<Account, sqlx::Error> {
        let status = input.status.unwrap_or_default();
        let query = format!(
            "INSERT INTO accounts (business_name, email, status, domain, notes, converted_at)
             VALUES ($1, $2, $3, $4, $5, CASE WHEN $3 = 'customer' THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(input.business_name.trim())
            .bind(&input.email)
            .bind(status.as_str())
            .bind(&input.domain)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Find an account by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all accounts ordered by most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Account>(&query).fetch_all(pool).await
    }

    /// Update an account's non-status fields. Only non-`None` fields are
    /// applied; `domain` and `notes` are set to NULL when listed in `clear`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &Validated<AccountChanges>,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET
                business_name = COALESCE($2, business_name),
                email = COALESCE($3, email),
                domain = CASE WHEN $6 THEN NULL ELSE COALESCE($4, domain) END,
                notes = CASE WHEN $7 THEN NULL ELSE COALESCE($5, notes) END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(input.business_name.as_deref().map(str::trim))
            .bind(&input.email)
            .bind(&input.domain)
            .bind(&input.notes)
            .bind(input.clears(ClearableField::Domain))
            .bind(input.clears(ClearableField::Notes))
            .fetch_optional(pool)
            .await
    }

    /// Read only the persisted status string.
    pub async fn read_status(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT status FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write a new status and updated-at stamp, plus `converted_at` when given.
    ///
    /// Returns `true` if a row changed.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        updated_at: Timestamp,
        converted_at: Option<Timestamp>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET
                status = $2,
                updated_at = $3,
                converted_at = COALESCE($4, converted_at)
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(updated_at)
        .bind(converted_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of projects referencing this account.
    pub async fn count_projects(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE account_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Permanently delete an account by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
