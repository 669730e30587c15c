pub mod account;
pub mod health;
pub mod project;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /vocabulary                                 closed vocabularies (GET)
///
/// /projects                                   list, create
/// /projects/{id}                              get, update, delete
/// /projects/{id}/status                       change status (POST)
/// /projects/{id}/transitions                  valid targets, ?target= check (GET)
/// /projects/{id}/history                      transition records (GET)
/// /projects/bulk/status                       bulk status change (POST)
/// /projects/bulk/delete                       bulk delete (POST)
/// /projects/bulk/allowed-actions              bulk pre-check (POST)
///
/// /accounts/...                               same shape as /projects
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/vocabulary", get(handlers::vocabulary::list))
        .nest("/projects", project::router())
        .nest("/accounts", account::router())
}
