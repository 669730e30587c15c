//! Route definitions for the `/projects` resource.

use axum::routing::{get, post};
use axum::Router;
use siteops_core::status::ProjectStatus;

use crate::handlers::{lifecycle, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> lifecycle::delete
/// POST   /{id}/status               -> lifecycle::change_status
/// GET    /{id}/transitions          -> lifecycle::transitions
/// GET    /{id}/history              -> lifecycle::history
/// POST   /bulk/status               -> lifecycle::bulk_change_status
/// POST   /bulk/delete               -> lifecycle::bulk_delete
/// POST   /bulk/allowed-actions      -> lifecycle::bulk_allowed_actions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(lifecycle::delete::<ProjectStatus>),
        )
        .route("/{id}/status", post(lifecycle::change_status::<ProjectStatus>))
        .route("/{id}/transitions", get(lifecycle::transitions::<ProjectStatus>))
        .route("/{id}/history", get(lifecycle::history::<ProjectStatus>))
        .route(
            "/bulk/status",
            post(lifecycle::bulk_change_status::<ProjectStatus>),
        )
        .route("/bulk/delete", post(lifecycle::bulk_delete::<ProjectStatus>))
        .route(
            "/bulk/allowed-actions",
            post(lifecycle::bulk_allowed_actions::<ProjectStatus>),
        )
}
