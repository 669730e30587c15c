//! Bulk status changes and deletions across a selection.
//!
//! Every member runs through the single-entity coordinator on its own. The
//! batch is not transactional: one member failing never stops or undoes the
//! others, and all members run to completion before the result is returned.
//! Outcomes come back in selection order.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::mutation::{Deletion, Lifecycle, MutationError, StatusChange};
use crate::rules::{LifecycleStatus, TransitionGuard};
use crate::types::DbId;
use crate::validation::{validate_reason, validate_selection};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome for one member of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntityOutcome<T> {
    Success {
        entity_id: DbId,
        detail: T,
    },
    Failure {
        entity_id: DbId,
        code: &'static str,
        reason: String,
    },
}

impl<T> EntityOutcome<T> {
    pub fn entity_id(&self) -> DbId {
        match self {
            Self::Success { entity_id, .. } | Self::Failure { entity_id, .. } => *entity_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregated outcome of a bulk operation. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkResult<T> {
    pub success_count: usize,
    pub failure_count: usize,
    pub outcomes: Vec<EntityOutcome<T>>,
}

impl<T> BulkResult<T> {
    pub fn from_results(results: Vec<(DbId, Result<T, MutationError>)>) -> Self {
        let outcomes: Vec<EntityOutcome<T>> = results
            .into_iter()
            .map(|(entity_id, result)| match result {
                Ok(detail) => EntityOutcome::Success { entity_id, detail },
                Err(err) => EntityOutcome::Failure {
                    entity_id,
                    code: err.code(),
                    reason: err.reason(),
                },
            })
            .collect();

        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            success_count,
            failure_count: outcomes.len() - success_count,
            outcomes,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && self.failure_count > 0
    }
}

/// Which bulk actions the console should offer for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkActions<S> {
    pub can_delete: bool,
    pub can_change_status: bool,
    /// Targets every selected member may move to.
    pub status_targets: Vec<S>,
}

// ---------------------------------------------------------------------------
// Pre-check
// ---------------------------------------------------------------------------

/// Compute the bulk actions offered for the current states of a selection.
///
/// This is an affordance gate evaluated before any per-entity guard call:
/// delete is offered only when every member is in the kind's bulk-deletable
/// state (`archived` projects, `inactive` accounts).
pub fn allowed_bulk_actions<S: LifecycleStatus>(
    guard: &TransitionGuard,
    selection: &[S],
) -> BulkActions<S> {
    if selection.is_empty() {
        return BulkActions {
            can_delete: false,
            can_change_status: false,
            status_targets: Vec::new(),
        };
    }

    let can_delete = selection.iter().all(|s| *s == S::bulk_deletable());

    let status_targets = S::all()
        .iter()
        .copied()
        .filter(|target| {
            selection
                .iter()
                .all(|current| current != target && guard.can_transition(*current, *target).allowed)
        })
        .collect();

    BulkActions {
        can_delete,
        can_change_status: true,
        status_targets,
    }
}

/// Drop repeated ids, keeping first-occurrence order.
fn dedup_selection(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

impl Lifecycle {
    /// Read the selection's current statuses and compute the offered actions.
    ///
    /// Selections the bulk mutations would refuse (empty or oversized) are
    /// refused here too, before any status is read.
    pub async fn allowed_bulk_actions<S: LifecycleStatus>(
        &self,
        ids: &[DbId],
    ) -> Result<BulkActions<S>, MutationError> {
        let report = validate_selection(ids);
        if !report.valid {
            return Err(MutationError::Validation(report));
        }

        let mut statuses = Vec::with_capacity(ids.len());
        for id in dedup_selection(ids) {
            statuses.push(self.current_status::<S>(id).await?);
        }
        Ok(allowed_bulk_actions(self.guard(), &statuses))
    }

    /// Apply one target status to every selected entity independently.
    ///
    /// Returns `Err` only when the request itself is invalid (empty or
    /// oversized selection, overlong reason). Member failures are reported in
    /// the result and never affect siblings.
    pub async fn apply_bulk_status_change<S: LifecycleStatus>(
        &self,
        ids: &[DbId],
        target: S,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<BulkResult<StatusChange<S>>, MutationError> {
        let mut report = validate_selection(ids);
        for (field, message) in validate_reason(reason).field_errors {
            report.add_field_error(field, message);
        }
        if !report.valid {
            return Err(MutationError::Validation(report));
        }

        let selection = dedup_selection(ids);
        let concurrency = self.config().bulk_concurrency.max(1);

        let results: Vec<(DbId, Result<StatusChange<S>, MutationError>)> =
            stream::iter(selection.into_iter().map(|id| async move {
                (id, self.apply_status_change(id, target, actor, reason).await)
            }))
            .buffered(concurrency)
            .collect()
            .await;

        let result = BulkResult::from_results(results);
        tracing::info!(
            kind = %S::KIND,
            to = %target,
            actor,
            success_count = result.success_count,
            failure_count = result.failure_count,
            "Bulk status change finished"
        );
        Ok(result)
    }

    /// Delete every selected entity that is in the bulk-deletable state.
    pub async fn apply_bulk_delete<S: LifecycleStatus>(
        &self,
        ids: &[DbId],
        actor: &str,
    ) -> Result<BulkResult<Deletion<S>>, MutationError> {
        let report = validate_selection(ids);
        if !report.valid {
            return Err(MutationError::Validation(report));
        }

        let selection = dedup_selection(ids);
        let concurrency = self.config().bulk_concurrency.max(1);

        let results: Vec<(DbId, Result<Deletion<S>, MutationError>)> =
            stream::iter(selection.into_iter().map(|id| async move {
                (id, self.delete_checked::<S>(id, actor, true).await)
            }))
            .buffered(concurrency)
            .collect()
            .await;

        let result = BulkResult::from_results(results);
        tracing::info!(
            kind = %S::KIND,
            actor,
            success_count = result.success_count,
            failure_count = result.failure_count,
            "Bulk delete finished"
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
