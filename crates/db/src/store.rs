//! Postgres implementation of the lifecycle persistence seam.

use async_trait::async_trait;
use siteops_core::audit::{NewTransitionRecord, TransitionRecord};
use siteops_core::status::EntityKind;
use siteops_core::store::{LifecycleStore, StatusUpdate, StoreError};
use siteops_core::types::DbId;

use crate::repositories::{AccountRepo, ProjectRepo, TransitionRecordRepo};
use crate::DbPool;

/// [`LifecycleStore`] backed by the `projects`, `accounts`, and
/// `transition_records` tables.
#[derive(Debug, Clone)]
pub struct PgLifecycleStore {
    pool: DbPool,
}

impl PgLifecycleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LifecycleStore for PgLifecycleStore {
    async fn read_status(&self, kind: EntityKind, id: DbId) -> Result<Option<String>, StoreError> {
        let status = match kind {
            EntityKind::Project => ProjectRepo::read_status(&self.pool, id).await,
            EntityKind::Account => AccountRepo::read_status(&self.pool, id).await,
        };
        status.map_err(StoreError::backend)
    }

    async fn write_status(
        &self,
        kind: EntityKind,
        id: DbId,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        let written = match kind {
            EntityKind::Project => {
                ProjectRepo::update_status(&self.pool, id, update.status, update.updated_at).await
            }
            EntityKind::Account => {
                AccountRepo::update_status(
                    &self.pool,
                    id,
                    update.status,
                    update.updated_at,
                    update.converted_at,
                )
                .await
            }
        };
        written.map_err(StoreError::backend)
    }

    async fn delete_entity(&self, kind: EntityKind, id: DbId) -> Result<bool, StoreError> {
        let deleted = match kind {
            EntityKind::Project => ProjectRepo::delete(&self.pool, id).await,
            EntityKind::Account => AccountRepo::delete(&self.pool, id).await,
        };
        deleted.map_err(StoreError::backend)
    }

    async fn count_account_projects(&self, account_id: DbId) -> Result<i64, StoreError> {
        AccountRepo::count_projects(&self.pool, account_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn insert_transition_record(
        &self,
        record: &NewTransitionRecord,
    ) -> Result<TransitionRecord, StoreError> {
        let row = TransitionRecordRepo::insert(&self.pool, record)
            .await
            .map_err(StoreError::backend)?;
        TransitionRecord::try_from(row).map_err(StoreError::backend)
    }

    async fn list_transition_records(
        &self,
        kind: EntityKind,
        id: DbId,
    ) -> Result<Vec<TransitionRecord>, StoreError> {
        TransitionRecordRepo::list_for_entity(&self.pool, kind, id)
            .await
            .map_err(StoreError::backend)?
            .into_iter()
            .map(|row| TransitionRecord::try_from(row).map_err(StoreError::backend))
            .collect()
    }
}
