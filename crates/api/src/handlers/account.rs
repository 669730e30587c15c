//! Handlers for the `/accounts` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use siteops_core::error::CoreError;
use siteops_core::types::DbId;
use siteops_core::validation::{AccountChanges, NewAccount, ValidatePayload};
use siteops_db::models::account::Account;
use siteops_db::repositories::AccountRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Account",
        id,
    })
}

/// POST /api/v1/accounts
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<DataResponse<Account>>)> {
    let input = input.validated()?;
    let account = AccountRepo::create(&state.pool, &input).await?;
    tracing::info!(account_id = account.id, status = %account.status, "Account created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: account })))
}

/// GET /api/v1/accounts
///
/// Each account carries its derived `project_count`.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Account>>>> {
    let accounts = AccountRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: accounts }))
}

/// GET /api/v1/accounts/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Account>>> {
    let account = AccountRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: account }))
}

/// PUT /api/v1/accounts/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AccountChanges>,
) -> AppResult<Json<DataResponse<Account>>> {
    let input = input.validated()?;
    let account = AccountRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: account }))
}
