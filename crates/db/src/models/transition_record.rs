//! Transition record row. Immutable once created (no updated_at).

use siteops_core::audit::TransitionRecord;
use siteops_core::status::EntityKind;
use siteops_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the append-only `transition_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct TransitionRecordRow {
    pub id: DbId,
    pub entity_kind: String,
    pub entity_id: DbId,
    pub from_status: String,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

impl TryFrom<TransitionRecordRow> for TransitionRecord {
    type Error = String;

    fn try_from(row: TransitionRecordRow) -> Result<Self, Self::Error> {
        Ok(TransitionRecord {
            id: row.id,
            entity_id: row.entity_id,
            entity_kind: EntityKind::from_str_value(&row.entity_kind)?,
            from_status: row.from_status,
            to_status: row.to_status,
            actor: row.actor,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}
