//! Route definitions for the `/accounts` resource.

use axum::routing::{get, post};
use axum::Router;
use siteops_core::status::AccountStatus;

use crate::handlers::{account, lifecycle};
use crate::state::AppState;

/// Routes mounted at `/accounts`.
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
        .route("/", get(account::list).post(account::create))
        .route(
            "/{id}",
            get(account::get_by_id)
                .put(account::update)
                .delete(lifecycle::delete::<AccountStatus>),
        )
        .route("/{id}/status", post(lifecycle::change_status::<AccountStatus>))
        .route("/{id}/transitions", get(lifecycle::transitions::<AccountStatus>))
        .route("/{id}/history", get(lifecycle::history::<AccountStatus>))
        .route(
            "/bulk/status",
            post(lifecycle::bulk_change_status::<AccountStatus>),
        )
        .route("/bulk/delete", post(lifecycle::bulk_delete::<AccountStatus>))
        .route(
            "/bulk/allowed-actions",
            post(lifecycle::bulk_allowed_actions::<AccountStatus>),
        )
}
