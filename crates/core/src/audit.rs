//! Transition audit trail.
//!
//! Every accepted status change appends one immutable [`TransitionRecord`].
//! Records are never updated, deleted or deduplicated: a replayed attempt
//! produces a second record.

use serde::{Deserialize, Serialize};

use crate::status::EntityKind;
use crate::store::{LifecycleStore, StoreError};
use crate::types::{DbId, Timestamp};

/// A persisted transition record. Has no `updated_at`; it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: DbId,
    pub entity_id: DbId,
    pub entity_kind: EntityKind,
    pub from_status: String,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

/// A transition record about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransitionRecord {
    pub entity_id: DbId,
    pub entity_kind: EntityKind,
    pub from_status: String,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

/// Appends transition records through a [`LifecycleStore`].
pub struct AuditTrail<'a> {
    store: &'a dyn LifecycleStore,
}

impl<'a> AuditTrail<'a> {
    pub fn new(store: &'a dyn LifecycleStore) -> Self {
        Self { store }
    }

    /// Append one record for an accepted transition.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        entity_id: DbId,
        entity_kind: EntityKind,
        from_status: &str,
        to_status: &str,
        actor: &str,
        reason: Option<&str>,
        at: Timestamp,
    ) -> Result<TransitionRecord, StoreError> {
        let record = NewTransitionRecord {
            entity_id,
            entity_kind,
            from_status: from_status.to_string(),
            to_status: to_status.to_string(),
            actor: actor.to_string(),
            reason: reason.map(str::to_string),
            created_at: at,
        };
        self.store.insert_transition_record(&record).await
    }

    /// All records for one entity, newest first.
    pub async fn history(
        &self,
        entity_kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<TransitionRecord>, StoreError> {
        self.store.list_transition_records(entity_kind, entity_id).await
    }
}
