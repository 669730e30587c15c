//! Repository for the append-only `transition_records` table.

use siteops_core::audit::NewTransitionRecord;
use siteops_core::status::EntityKind;
use siteops_core::types::DbId;
use sqlx::PgPool;

use crate::models::transition_record::TransitionRecordRow;

const COLUMNS: &str =
    "id, entity_kind, entity_id, from_status, to_status, actor, reason, created_at";

/// Insert and read transition records. There is no update or delete.
pub struct TransitionRecordRepo;

impl TransitionRecordRepo {
    /// Append one record.
    pub async fn insert(
        pool: &PgPool,
        record: &NewTransitionRecord,
    ) -> Result<TransitionRecordRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO transition_records
                (entity_kind, entity_id, from_status, to_status, actor, reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TransitionRecordRow>(&query)
            .bind(record.entity_kind.as_str())
            .bind(record.entity_id)
            .bind(&record.from_status)
            .bind(&record.to_status)
            .bind(&record.actor)
            .bind(&record.reason)
            .bind(record.created_at)
            .fetch_one(pool)
            .await
    }

    /// All records for one entity, newest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        kind: EntityKind,
        entity_id: DbId,
    ) -> Result<Vec<TransitionRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transition_records
             WHERE entity_kind = $1 AND entity_id = $2
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TransitionRecordRow>(&query)
            .bind(kind.as_str())
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
