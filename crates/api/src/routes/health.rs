use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use siteops_core::mutation::Lifecycle;
use siteops_core::validation::MAX_BULK_SELECTION;

use crate::state::AppState;

/// Payload of `GET /health`.
///
/// Besides database reachability it reports the lifecycle settings the
/// process was started with, so operators can confirm which account
/// transition policy is live without reading the environment.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub lifecycle: LifecycleSettings,
}

/// Lifecycle knobs currently in effect.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub account_policy: &'static str,
    pub bulk_concurrency: usize,
    pub max_bulk_selection: usize,
}

impl LifecycleSettings {
    pub fn of(lifecycle: &Lifecycle) -> Self {
        Self {
            account_policy: lifecycle.guard().account_policy().as_str(),
            bulk_concurrency: lifecycle.config().bulk_concurrency.max(1),
            max_bulk_selection: MAX_BULK_SELECTION,
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = siteops_db::health_check(&state.pool).await.is_ok();
    if !db_healthy {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        lifecycle: LifecycleSettings::of(&state.lifecycle),
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
