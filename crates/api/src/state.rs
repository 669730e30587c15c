use std::sync::Arc;

use siteops_core::mutation::Lifecycle;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: siteops_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Status-change, deletion and bulk coordinators over the database.
    pub lifecycle: Lifecycle,
}

impl AppState {
    /// Wire the lifecycle coordinators to a Postgres-backed store.
    pub fn new(pool: siteops_db::DbPool, config: ServerConfig) -> Self {
        let store = Arc::new(siteops_db::store::PgLifecycleStore::new(pool.clone()));
        let lifecycle = Lifecycle::new(store, config.lifecycle);
        Self {
            pool,
            config: Arc::new(config),
            lifecycle,
        }
    }
}
