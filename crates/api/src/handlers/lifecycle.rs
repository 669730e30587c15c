//! Status, history and bulk handlers shared by `/projects` and `/accounts`.
//!
//! Each handler is generic over the status vocabulary; the routers pick the
//! kind with a turbofish, e.g. `post(lifecycle::change_status::<ProjectStatus>)`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use siteops_core::audit::TransitionRecord;
use siteops_core::bulk::{BulkActions, BulkResult};
use siteops_core::mutation::{Deletion, StatusChange};
use siteops_core::rules::{LifecycleStatus, TransitionDecision};
use siteops_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::actor::Actor;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest<S> {
    pub status: S,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionsQuery<S> {
    pub target: Option<S>,
}

/// Where an entity may move from its current status.
#[derive(Debug, Serialize)]
pub struct TransitionOptions<S> {
    pub current: S,
    pub valid_targets: Vec<S>,
    /// Present when a specific `target` was asked about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<TransitionDecision>,
}

#[derive(Debug, Deserialize)]
pub struct BulkSelection {
    pub ids: Vec<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest<S> {
    pub ids: Vec<DbId>,
    pub status: S,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Single entity
// ---------------------------------------------------------------------------

/// POST /api/v1/{kind}/{id}/status
pub async fn change_status<S>(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<DbId>,
    Json(input): Json<StatusChangeRequest<S>>,
) -> AppResult<Json<DataResponse<StatusChange<S>>>>
where
    S: LifecycleStatus + Serialize + DeserializeOwned,
{
    let change = state
        .lifecycle
        .apply_status_change(id, input.status, &actor.0, input.reason.as_deref())
        .await?;
    Ok(Json(DataResponse { data: change }))
}

/// GET /api/v1/{kind}/{id}/transitions?target=
pub async fn transitions<S>(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<TransitionsQuery<S>>,
) -> AppResult<Json<DataResponse<TransitionOptions<S>>>>
where
    S: LifecycleStatus + Serialize + DeserializeOwned,
{
    let current = state.lifecycle.current_status::<S>(id).await?;
    let options = TransitionOptions {
        current,
        valid_targets: state.lifecycle.guard().valid_targets(current),
        decision: query
            .target
            .map(|target| state.lifecycle.check_change(current, target)),
    };
    Ok(Json(DataResponse { data: options }))
}

/// GET /api/v1/{kind}/{id}/history
///
/// History outlives the entity, so a deleted id still returns its records.
pub async fn history<S>(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TransitionRecord>>>>
where
    S: LifecycleStatus,
{
    let records = state.lifecycle.history(S::KIND, id).await?;
    Ok(Json(DataResponse { data: records }))
}

/// DELETE /api/v1/{kind}/{id}
pub async fn delete<S>(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode>
where
    S: LifecycleStatus,
{
    state.lifecycle.delete::<S>(id, &actor.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Bulk
// ---------------------------------------------------------------------------

/// POST /api/v1/{kind}/bulk/status
pub async fn bulk_change_status<S>(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<BulkStatusRequest<S>>,
) -> AppResult<Json<DataResponse<BulkResult<StatusChange<S>>>>>
where
    S: LifecycleStatus + Serialize + DeserializeOwned,
{
    let result = state
        .lifecycle
        .apply_bulk_status_change(&input.ids, input.status, &actor.0, input.reason.as_deref())
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/{kind}/bulk/delete
pub async fn bulk_delete<S>(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<BulkSelection>,
) -> AppResult<Json<DataResponse<BulkResult<Deletion<S>>>>>
where
    S: LifecycleStatus + Serialize,
{
    let result = state
        .lifecycle
        .apply_bulk_delete::<S>(&input.ids, &actor.0)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/{kind}/bulk/allowed-actions
pub async fn bulk_allowed_actions<S>(
    State(state): State<AppState>,
    Json(input): Json<BulkSelection>,
) -> AppResult<Json<DataResponse<BulkActions<S>>>>
where
    S: LifecycleStatus + Serialize,
{
    let actions = state.lifecycle.allowed_bulk_actions::<S>(&input.ids).await?;
    Ok(Json(DataResponse { data: actions }))
}
