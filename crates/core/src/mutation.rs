//! Single-entity status changes and deletions.
//!
//! [`Lifecycle`] is the entry point the HTTP layer (or any other caller) uses
//! to change a project's or account's status. It re-reads the persisted
//! status, asks the [`TransitionGuard`], writes only on allow, and then appends
//! one transition record. The audit append is a second step: if it fails the
//! status change stays committed and the failure is logged.
//!
//! There is no optimistic-concurrency check: a concurrent external write
//! between the read and the write is not detected.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::audit::{AuditTrail, TransitionRecord};
use crate::rules::{AccountTransitionPolicy, LifecycleStatus, TransitionDecision, TransitionGuard};
use crate::status::EntityKind;
use crate::store::{LifecycleStore, StatusUpdate, StoreError};
use crate::types::{DbId, Timestamp};
use crate::validation::{validate_reason, ValidationReport};

/// Default number of bulk members processed concurrently.
pub const DEFAULT_BULK_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub account_policy: AccountTransitionPolicy,
    /// Upper bound on concurrently running members of one bulk operation.
    pub bulk_concurrency: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            account_policy: AccountTransitionPolicy::default(),
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a mutation did not happen.
///
/// Validation, denial and not-found errors are detected before any write and
/// are always safe to retry. A persistence failure may leave the entity and
/// its audit trail out of step.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Transition denied: {reason}")]
    TransitionDenied { reason: String },

    #[error("Deletion denied: {reason}")]
    DeletionDenied { reason: String },

    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: DbId },

    #[error("{kind} {id} has unrecognized persisted status '{value}'")]
    UnknownStatus {
        kind: EntityKind,
        id: DbId,
        value: String,
    },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl MutationError {
    /// Stable machine-readable code, shared with the HTTP error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TransitionDenied { .. } => "TRANSITION_DENIED",
            Self::DeletionDenied { .. } => "DELETION_DENIED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::UnknownStatus { .. } | Self::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// The operator-facing message: the bare reason for denials.
    pub fn reason(&self) -> String {
        match self {
            Self::TransitionDenied { reason } | Self::DeletionDenied { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the error was raised before anything was written.
    pub fn is_retry_safe(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::TransitionDenied { .. }
                | Self::DeletionDenied { .. }
                | Self::NotFound { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// An accepted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange<S> {
    pub entity_id: DbId,
    pub from: S,
    pub to: S,
    pub changed_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<Timestamp>,
    /// `false` if the status was written but the transition record was not.
    pub audit_recorded: bool,
}

/// A completed deletion, with the status the entity had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deletion<S> {
    pub entity_id: DbId,
    pub status: S,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Coordinates status changes and deletions for projects and accounts.
///
/// Cheap to clone; the store and guard are shared.
#[derive(Clone)]
pub struct Lifecycle {
    store: Arc<dyn LifecycleStore>,
    guard: Arc<TransitionGuard>,
    config: LifecycleConfig,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn LifecycleStore>, config: LifecycleConfig) -> Self {
        Self {
            store,
            guard: Arc::new(TransitionGuard::new(config.account_policy)),
            config,
        }
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn audit(&self) -> AuditTrail<'_> {
        AuditTrail::new(self.store.as_ref())
    }

    /// Pure guard check, no storage access.
    pub fn can_transition<S: LifecycleStatus>(&self, current: S, target: S) -> TransitionDecision {
        self.guard.can_transition(current, target)
    }

    /// The decision [`Lifecycle::apply_status_change`] would reach for an
    /// entity currently in `current`: the guard's verdict, except that a
    /// change to the status the entity already has is always refused.
    pub fn check_change<S: LifecycleStatus>(&self, current: S, target: S) -> TransitionDecision {
        if current == target {
            return TransitionDecision::deny(format!("{} is already {target}", S::KIND.label()));
        }
        self.guard.can_transition(current, target)
    }

    /// Read and parse the persisted status of one entity.
    pub async fn current_status<S: LifecycleStatus>(&self, id: DbId) -> Result<S, MutationError> {
        let raw = self
            .store
            .read_status(S::KIND, id)
            .await?
            .ok_or(MutationError::NotFound { kind: S::KIND, id })?;

        raw.parse::<S>().map_err(|_| MutationError::UnknownStatus {
            kind: S::KIND,
            id,
            value: raw,
        })
    }

    /// Transition records for one entity, newest first.
    pub async fn history(
        &self,
        kind: EntityKind,
        id: DbId,
    ) -> Result<Vec<TransitionRecord>, MutationError> {
        Ok(self.audit().history(kind, id).await?)
    }

    /// Change one entity's status if the guard allows it.
    ///
    /// A target equal to the current status is refused as a no-op, for every
    /// state and kind, so it never writes and never leaves a record.
    pub async fn apply_status_change<S: LifecycleStatus>(
        &self,
        id: DbId,
        target: S,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<StatusChange<S>, MutationError> {
        let report = validate_reason(reason);
        if !report.valid {
            return Err(MutationError::Validation(report));
        }

        let current = self.current_status::<S>(id).await?;

        let decision = self.check_change(current, target);
        if !decision.allowed {
            let reason = decision
                .reason
                .unwrap_or_else(|| format!("{current} -> {target} is not permitted"));
            tracing::info!(
                kind = %S::KIND,
                entity_id = id,
                from = %current,
                to = %target,
                actor,
                reason = %reason,
                "Status transition denied"
            );
            return Err(MutationError::TransitionDenied { reason });
        }

        let now = Utc::now();
        let update = StatusUpdate {
            status: target.value(),
            updated_at: now,
            converted_at: target.stamps_conversion().then_some(now),
        };

        let written = self
            .store
            .write_status(S::KIND, id, &update)
            .await
            .map_err(|e| {
                tracing::error!(
                    kind = %S::KIND,
                    entity_id = id,
                    to = %target,
                    error = %e,
                    "Status write failed"
                );
                MutationError::Persistence(e)
            })?;
        if !written {
            return Err(MutationError::NotFound { kind: S::KIND, id });
        }

        let audit_recorded = match self
            .audit()
            .record(id, S::KIND, current.value(), target.value(), actor, reason, now)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    kind = %S::KIND,
                    entity_id = id,
                    from = %current,
                    to = %target,
                    actor,
                    error = %e,
                    "Transition record write failed; status change kept"
                );
                false
            }
        };

        tracing::info!(
            kind = %S::KIND,
            entity_id = id,
            from = %current,
            to = %target,
            actor,
            audit_recorded,
            "Status changed"
        );

        Ok(StatusChange {
            entity_id: id,
            from: current,
            to: target,
            changed_at: now,
            converted_at: update.converted_at,
            audit_recorded,
        })
    }

    /// Hard-delete one entity if its current state allows it.
    ///
    /// Projects are deletable in `draft` or `archived`; accounts only when
    /// `inactive` and owning no projects.
    pub async fn delete<S: LifecycleStatus>(
        &self,
        id: DbId,
        actor: &str,
    ) -> Result<Deletion<S>, MutationError> {
        self.delete_checked(id, actor, false).await
    }

    /// Shared by single and bulk deletion. Bulk deletion is narrower: only
    /// [`LifecycleStatus::bulk_deletable`] members are removed.
    pub(crate) async fn delete_checked<S: LifecycleStatus>(
        &self,
        id: DbId,
        actor: &str,
        bulk: bool,
    ) -> Result<Deletion<S>, MutationError> {
        let current = self.current_status::<S>(id).await?;

        if bulk && current != S::bulk_deletable() {
            return Err(MutationError::DeletionDenied {
                reason: format!(
                    "Bulk delete only applies to {} {}s",
                    S::bulk_deletable(),
                    S::KIND
                ),
            });
        }

        if let Some(blocker) = current.deletion_blocker() {
            return Err(MutationError::DeletionDenied {
                reason: blocker.to_string(),
            });
        }

        if S::KIND == EntityKind::Account {
            let projects = self.store.count_account_projects(id).await?;
            if projects > 0 {
                return Err(MutationError::DeletionDenied {
                    reason: format!("Account still owns {projects} project(s)"),
                });
            }
        }

        if !self.store.delete_entity(S::KIND, id).await? {
            return Err(MutationError::NotFound { kind: S::KIND, id });
        }

        tracing::info!(
            kind = %S::KIND,
            entity_id = id,
            status = %current,
            actor,
            "Entity deleted"
        );

        Ok(Deletion {
            entity_id: id,
            status: current,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::status::{AccountStatus, ProjectStatus};
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, Lifecycle) {
        let store = Arc::new(MemoryStore::new());
        let lifecycle = Lifecycle::new(store.clone(), LifecycleConfig::default());
        (store, lifecycle)
    }

    #[tokio::test]
    async fn allowed_change_writes_status_and_one_record() {
        let (store, lc) = setup();
        store.insert_project(1, "prospect-staging", Some(10));

        let change = lc
            .apply_status_change(1, ProjectStatus::LiveCustomer, "ops@siteops.test", Some("launch"))
            .await
            .unwrap();

        assert_eq!(change.from, ProjectStatus::ProspectStaging);
        assert_eq!(change.to, ProjectStatus::LiveCustomer);
        assert!(change.audit_recorded);
        assert_eq!(
            store.status_of(EntityKind::Project, 1).as_deref(),
            Some("live-customer")
        );

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_status, "prospect-staging");
        assert_eq!(records[0].to_status, "live-customer");
        assert_eq!(records[0].actor, "ops@siteops.test");
        assert_eq!(records[0].reason.as_deref(), Some("launch"));
        assert_eq!(records[0].entity_kind, EntityKind::Project);
    }

    #[tokio::test]
    async fn denied_change_writes_nothing() {
        let (store, lc) = setup();
        store.insert_project(1, "live-customer", Some(10));

        let err = lc
            .apply_status_change(1, ProjectStatus::Archived, "ops", None)
            .await
            .unwrap_err();

        assert_matches!(err, MutationError::TransitionDenied { ref reason } if reason.contains("paused-maintenance"));
        assert!(err.is_retry_safe());
        assert_eq!(
            store.status_of(EntityKind::Project, 1).as_deref(),
            Some("live-customer")
        );
        assert!(store.records().is_empty());
        assert!(store.entity(EntityKind::Project, 1).unwrap().updated_at.is_none());
    }

    #[tokio::test]
    async fn self_transition_is_refused_without_record() {
        let (store, lc) = setup();
        store.insert_project(1, "draft", None);
        store.insert_account(2, "customer");

        let err = lc
            .apply_status_change(1, ProjectStatus::Draft, "ops", None)
            .await
            .unwrap_err();
        assert_matches!(err, MutationError::TransitionDenied { ref reason } if reason == "Project is already draft");

        let err = lc
            .apply_status_change(2, AccountStatus::Customer, "ops", None)
            .await
            .unwrap_err();
        assert_matches!(err, MutationError::TransitionDenied { .. });
        assert!(store.records().is_empty());
    }

    #[test]
    fn check_change_refuses_staying_put_where_guard_allows_it() {
        let (_store, lc) = setup();

        assert!(lc.can_transition(ProjectStatus::Draft, ProjectStatus::Draft).allowed);
        let decision = lc.check_change(ProjectStatus::Draft, ProjectStatus::Draft);
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("Project is already draft"));

        assert_eq!(
            lc.check_change(AccountStatus::Inactive, AccountStatus::Customer),
            lc.can_transition(AccountStatus::Inactive, AccountStatus::Customer)
        );
    }

    #[tokio::test]
    async fn missing_entity_is_not_found() {
        let (_store, lc) = setup();
        let err = lc
            .apply_status_change(99, ProjectStatus::Archived, "ops", None)
            .await
            .unwrap_err();
        assert_matches!(
            err,
            MutationError::NotFound {
                kind: EntityKind::Project,
                id: 99
            }
        );
    }

    #[tokio::test]
    async fn corrupt_persisted_status_is_reported() {
        let (store, lc) = setup();
        store.insert_project(1, "published", None);
        let err = lc
            .apply_status_change(1, ProjectStatus::Draft, "ops", None)
            .await
            .unwrap_err();
        assert_matches!(err, MutationError::UnknownStatus { ref value, .. } if value == "published");
    }

    #[tokio::test]
    async fn overlong_reason_is_rejected_before_read() {
        let (store, lc) = setup();
        store.insert_project(1, "draft", None);
        let reason = "x".repeat(600);
        let err = lc
            .apply_status_change(1, ProjectStatus::Archived, "ops", Some(&reason))
            .await
            .unwrap_err();
        assert_matches!(err, MutationError::Validation(ref report) if report.field_errors.contains_key("reason"));
        assert_eq!(store.status_of(EntityKind::Project, 1).as_deref(), Some("draft"));
    }

    #[tokio::test]
    async fn audit_failure_keeps_status_change() {
        let (store, lc) = setup();
        store.insert_project(1, "paused-maintenance", Some(10));
        store.fail_audit(true);

        let change = lc
            .apply_status_change(1, ProjectStatus::Archived, "ops", None)
            .await
            .unwrap();

        assert!(!change.audit_recorded);
        assert_eq!(store.status_of(EntityKind::Project, 1).as_deref(), Some("archived"));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_persistence_error_without_record() {
        let (store, lc) = setup();
        store.insert_project(1, "draft", None);
        store.fail_writes_for(EntityKind::Project, 1);

        let err = lc
            .apply_status_change(1, ProjectStatus::TemplatePublic, "ops", None)
            .await
            .unwrap_err();

        assert_matches!(err, MutationError::Persistence(_));
        assert!(!err.is_retry_safe());
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn becoming_customer_stamps_converted_at() {
        let (store, lc) = setup();
        store.insert_account(5, "prospect");

        let change = lc
            .apply_status_change(5, AccountStatus::Customer, "sales", None)
            .await
            .unwrap();

        assert!(change.converted_at.is_some());
        let entity = store.entity(EntityKind::Account, 5).unwrap();
        assert_eq!(entity.converted_at, change.converted_at);
        assert_eq!(entity.status, "customer");
    }

    #[tokio::test]
    async fn other_account_moves_leave_converted_at_alone() {
        let (store, lc) = setup();
        store.insert_account(5, "customer");

        let change = lc
            .apply_status_change(5, AccountStatus::Inactive, "sales", None)
            .await
            .unwrap();

        assert!(change.converted_at.is_none());
        assert!(store.entity(EntityKind::Account, 5).unwrap().converted_at.is_none());
    }

    #[tokio::test]
    async fn inactive_account_cannot_become_customer() {
        let (store, lc) = setup();
        store.insert_account(5, "inactive");
        let err = lc
            .apply_status_change(5, AccountStatus::Customer, "sales", None)
            .await
            .unwrap_err();
        assert_matches!(err, MutationError::TransitionDenied { .. });
        assert_eq!(store.status_of(EntityKind::Account, 5).as_deref(), Some("inactive"));
    }

    #[tokio::test]
    async fn permissive_policy_allows_customer_downgrade() {
        let store = Arc::new(MemoryStore::new());
        store.insert_account(5, "customer");
        let lc = Lifecycle::new(
            store.clone(),
            LifecycleConfig {
                account_policy: AccountTransitionPolicy::Permissive,
                ..Default::default()
            },
        );

        lc.apply_status_change(5, AccountStatus::Prospect, "sales", None)
            .await
            .unwrap();
        assert_eq!(store.status_of(EntityKind::Account, 5).as_deref(), Some("prospect"));
    }

    // -- Deletion -------------------------------------------------------------

    #[tokio::test]
    async fn draft_and_archived_projects_are_deletable() {
        let (store, lc) = setup();
        store.insert_project(1, "draft", None);
        store.insert_project(2, "archived", Some(3));

        let deleted = lc.delete::<ProjectStatus>(1, "ops").await.unwrap();
        assert_eq!(deleted.status, ProjectStatus::Draft);
        lc.delete::<ProjectStatus>(2, "ops").await.unwrap();
        assert!(store.entity(EntityKind::Project, 1).is_none());
        assert!(store.entity(EntityKind::Project, 2).is_none());
    }

    #[tokio::test]
    async fn live_project_is_not_deletable() {
        let (store, lc) = setup();
        store.insert_project(1, "live-customer", Some(3));
        let err = lc.delete::<ProjectStatus>(1, "ops").await.unwrap_err();
        assert_matches!(err, MutationError::DeletionDenied { .. });
        assert!(store.entity(EntityKind::Project, 1).is_some());
    }

    #[tokio::test]
    async fn account_with_projects_is_not_deletable() {
        let (store, lc) = setup();
        store.insert_account(3, "inactive");
        store.insert_project(1, "archived", Some(3));

        let err = lc.delete::<AccountStatus>(3, "ops").await.unwrap_err();
        assert_matches!(err, MutationError::DeletionDenied { ref reason } if reason.contains("1 project"));

        lc.delete::<ProjectStatus>(1, "ops").await.unwrap();
        lc.delete::<AccountStatus>(3, "ops").await.unwrap();
        assert!(store.entity(EntityKind::Account, 3).is_none());
    }

    #[tokio::test]
    async fn active_account_is_not_deletable() {
        let (store, lc) = setup();
        store.insert_account(3, "customer");
        let err = lc.delete::<AccountStatus>(3, "ops").await.unwrap_err();
        assert_matches!(err, MutationError::DeletionDenied { ref reason } if reason.contains("inactive"));
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let (store, lc) = setup();
        store.insert_project(1, "draft", Some(2));
        lc.apply_status_change(1, ProjectStatus::ProspectStaging, "ops", None)
            .await
            .unwrap();
        lc.apply_status_change(1, ProjectStatus::LiveCustomer, "ops", None)
            .await
            .unwrap();

        let history = lc.history(EntityKind::Project, 1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to_status, "live-customer");
        assert_eq!(history[1].to_status, "prospect-staging");
    }
}
