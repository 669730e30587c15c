//! Persistence seam for the lifecycle core.
//!
//! The coordinators only need kind-scoped record CRUD: read a status, write
//! status fields, delete a record, count an account's projects, and append
//! or list transition records. `siteops-db` implements this over Postgres;
//! [`MemoryStore`] implements it in memory for tests and local tooling.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::audit::{NewTransitionRecord, TransitionRecord};
use crate::status::EntityKind;
use crate::types::{DbId, Timestamp};

/// Failure reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

/// Fields written together by an accepted status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: &'static str,
    pub updated_at: Timestamp,
    /// Set when the new status stamps a conversion (account -> customer).
    pub converted_at: Option<Timestamp>,
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Current persisted status, or `None` if the record does not exist.
    async fn read_status(&self, kind: EntityKind, id: DbId) -> Result<Option<String>, StoreError>;

    /// Write status fields. Returns `false` if the record does not exist.
    async fn write_status(
        &self,
        kind: EntityKind,
        id: DbId,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError>;

    /// Hard-delete a record. Returns `false` if the record does not exist.
    async fn delete_entity(&self, kind: EntityKind, id: DbId) -> Result<bool, StoreError>;

    /// Number of projects owned by an account.
    async fn count_account_projects(&self, account_id: DbId) -> Result<i64, StoreError>;

    async fn insert_transition_record(
        &self,
        record: &NewTransitionRecord,
    ) -> Result<TransitionRecord, StoreError>;

    /// Transition records for one entity, newest first.
    async fn list_transition_records(
        &self,
        kind: EntityKind,
        id: DbId,
    ) -> Result<Vec<TransitionRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntity {
    pub status: String,
    pub updated_at: Option<Timestamp>,
    pub converted_at: Option<Timestamp>,
    /// Owning account, for projects.
    pub account_id: Option<DbId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entities: HashMap<(EntityKind, DbId), MemoryEntity>,
    records: Vec<TransitionRecord>,
    failing_writes: HashSet<(EntityKind, DbId)>,
    failing_audit: bool,
}

/// In-memory [`LifecycleStore`] with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend("memory store lock poisoned"))
    }

    fn lock_for_setup(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_project(&self, id: DbId, status: &str, account_id: Option<DbId>) {
        self.lock_for_setup().entities.insert(
            (EntityKind::Project, id),
            MemoryEntity {
                status: status.to_string(),
                updated_at: None,
                converted_at: None,
                account_id,
            },
        );
    }

    pub fn insert_account(&self, id: DbId, status: &str) {
        self.lock_for_setup().entities.insert(
            (EntityKind::Account, id),
            MemoryEntity {
                status: status.to_string(),
                updated_at: None,
                converted_at: None,
                account_id: None,
            },
        );
    }

    pub fn entity(&self, kind: EntityKind, id: DbId) -> Option<MemoryEntity> {
        self.lock_for_setup().entities.get(&(kind, id)).cloned()
    }

    pub fn status_of(&self, kind: EntityKind, id: DbId) -> Option<String> {
        self.entity(kind, id).map(|e| e.status)
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.lock_for_setup().records.clone()
    }

    /// Make every status write for this record fail.
    pub fn fail_writes_for(&self, kind: EntityKind, id: DbId) {
        self.lock_for_setup().failing_writes.insert((kind, id));
    }

    /// Make every transition record insert fail.
    pub fn fail_audit(&self, failing: bool) {
        self.lock_for_setup().failing_audit = failing;
    }
}

#[async_trait]
impl LifecycleStore for MemoryStore {
    async fn read_status(&self, kind: EntityKind, id: DbId) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.entities.get(&(kind, id)).map(|e| e.status.clone()))
    }

    async fn write_status(
        &self,
        kind: EntityKind,
        id: DbId,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        if state.failing_writes.contains(&(kind, id)) {
            return Err(StoreError::backend(format!("write to {kind} {id} failed")));
        }
        match state.entities.get_mut(&(kind, id)) {
            Some(entity) => {
                entity.status = update.status.to_string();
                entity.updated_at = Some(update.updated_at);
                if update.converted_at.is_some() {
                    entity.converted_at = update.converted_at;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_entity(&self, kind: EntityKind, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        if state.failing_writes.contains(&(kind, id)) {
            return Err(StoreError::backend(format!("delete of {kind} {id} failed")));
        }
        Ok(state.entities.remove(&(kind, id)).is_some())
    }

    async fn count_account_projects(&self, account_id: DbId) -> Result<i64, StoreError> {
        let state = self.lock()?;
        let count = state
            .entities
            .iter()
            .filter(|((kind, _), e)| {
                *kind == EntityKind::Project && e.account_id == Some(account_id)
            })
            .count();
        Ok(count as i64)
    }

    async fn insert_transition_record(
        &self,
        record: &NewTransitionRecord,
    ) -> Result<TransitionRecord, StoreError> {
        let mut state = self.lock()?;
        if state.failing_audit {
            return Err(StoreError::backend("transition record insert failed"));
        }
        let stored = TransitionRecord {
            id: state.records.len() as DbId + 1,
            entity_id: record.entity_id,
            entity_kind: record.entity_kind,
            from_status: record.from_status.clone(),
            to_status: record.to_status.clone(),
            actor: record.actor.clone(),
            reason: record.reason.clone(),
            created_at: record.created_at,
        };
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn list_transition_records(
        &self,
        kind: EntityKind,
        id: DbId,
    ) -> Result<Vec<TransitionRecord>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .rev()
            .filter(|r| r.entity_kind == kind && r.entity_id == id)
            .cloned()
            .collect())
    }
}
