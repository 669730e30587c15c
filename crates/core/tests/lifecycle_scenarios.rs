//! End-to-end lifecycle scenarios against the in-memory store.
//!
//! Exercises the public API the way the admin console drives it: validate a
//! payload, check a transition, apply single and bulk changes, and inspect
//! the transition history.

use std::sync::Arc;

use assert_matches::assert_matches;
use siteops_core::bulk::EntityOutcome;
use siteops_core::mutation::{Lifecycle, LifecycleConfig, MutationError};
use siteops_core::rules::TransitionGuard;
use siteops_core::status::{AccountStatus, EntityKind, ProjectStatus, ProjectType};
use siteops_core::store::MemoryStore;
use siteops_core::validation::{NewProject, ValidatePayload, FORM_ERROR_ACCOUNT_REQUIRED};

fn lifecycle() -> (Arc<MemoryStore>, Lifecycle) {
    let store = Arc::new(MemoryStore::new());
    let lc = Lifecycle::new(store.clone(), LifecycleConfig::default());
    (store, lc)
}

// ---------------------------------------------------------------------------
// Guard properties
// ---------------------------------------------------------------------------

#[test]
fn archived_allows_exactly_draft() {
    let guard = TransitionGuard::default();
    let allowed: Vec<ProjectStatus> = ProjectStatus::ALL
        .iter()
        .copied()
        .filter(|t| guard.can_transition(ProjectStatus::Archived, *t).allowed)
        .collect();
    assert_eq!(allowed, vec![ProjectStatus::Draft]);
}

#[test]
fn draft_allows_every_status() {
    let guard = TransitionGuard::default();
    assert!(ProjectStatus::ALL
        .iter()
        .all(|t| guard.can_transition(ProjectStatus::Draft, *t).allowed));
}

#[test]
fn inactive_account_never_jumps_to_customer() {
    let decision = TransitionGuard::default().can_transition(AccountStatus::Inactive, AccountStatus::Customer);
    assert!(!decision.allowed);
    assert!(decision.reason.is_some());
}

// ---------------------------------------------------------------------------
// Validation round-trip
// ---------------------------------------------------------------------------

#[test]
fn template_without_account_validates_but_main_site_does_not() {
    let template = NewProject {
        name: "Starter Theme".to_string(),
        project_type: ProjectType::Template,
        account_id: None,
        deployment_status: None,
    };
    assert!(template.validated().is_ok());

    let main_site = NewProject {
        name: "Acme Main".to_string(),
        project_type: ProjectType::MainSite,
        account_id: None,
        deployment_status: None,
    };
    let report = main_site.validated().unwrap_err();
    assert!(report.field_errors.is_empty());
    assert_eq!(report.form_errors, vec![FORM_ERROR_ACCOUNT_REQUIRED.to_string()]);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn live_project_is_archived_through_maintenance() {
    let (store, lc) = lifecycle();
    store.insert_project(1, "live-customer", Some(7));

    let err = lc
        .apply_status_change(1, ProjectStatus::Archived, "ops", None)
        .await
        .unwrap_err();
    assert_matches!(err, MutationError::TransitionDenied { ref reason } if reason.contains("paused-maintenance"));

    lc.apply_status_change(1, ProjectStatus::PausedMaintenance, "ops", Some("client paused"))
        .await
        .unwrap();
    lc.apply_status_change(1, ProjectStatus::Archived, "ops", Some("contract ended"))
        .await
        .unwrap();

    let history = lc.history(EntityKind::Project, 1).await.unwrap();
    let steps: Vec<(&str, &str)> = history
        .iter()
        .rev()
        .map(|r| (r.from_status.as_str(), r.to_status.as_str()))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("live-customer", "paused-maintenance"),
            ("paused-maintenance", "archived"),
        ]
    );
}

#[tokio::test]
async fn bulk_change_counts_match_guard_eligibility() {
    let (store, lc) = lifecycle();
    // Eligible for archiving: draft, paused-maintenance, template-public.
    store.insert_project(1, "draft", None);
    store.insert_project(2, "paused-maintenance", Some(7));
    store.insert_project(3, "template-public", None);
    // Not eligible: live-customer, already archived.
    store.insert_project(4, "live-customer", Some(7));
    store.insert_project(5, "archived", Some(7));

    let result = lc
        .apply_bulk_status_change(&[5, 4, 3, 2, 1], ProjectStatus::Archived, "ops", None)
        .await
        .unwrap();

    assert_eq!(result.success_count, 3);
    assert_eq!(result.failure_count, 2);
    for id in [1, 2, 3] {
        assert_eq!(store.status_of(EntityKind::Project, id).as_deref(), Some("archived"));
    }
    assert_eq!(store.status_of(EntityKind::Project, 4).as_deref(), Some("live-customer"));

    // Exactly one record per successfully changed entity.
    let records = store.records();
    assert_eq!(records.len(), 3);
    let mut recorded: Vec<i64> = records.iter().map(|r| r.entity_id).collect();
    recorded.sort_unstable();
    assert_eq!(recorded, vec![1, 2, 3]);
}

#[tokio::test]
async fn bulk_account_delete_precheck_requires_all_inactive() {
    let (store, lc) = lifecycle();
    store.insert_account(1, "inactive");
    store.insert_account(2, "inactive");
    store.insert_account(3, "customer");

    let actions = lc
        .allowed_bulk_actions::<AccountStatus>(&[1, 2, 3])
        .await
        .unwrap();
    assert!(!actions.can_delete);
    assert!(actions.can_change_status);
}

#[tokio::test]
async fn audit_outage_does_not_block_bulk_changes() {
    let (store, lc) = lifecycle();
    store.insert_account(1, "prospect");
    store.insert_account(2, "prospect");
    store.fail_audit(true);

    let result = lc
        .apply_bulk_status_change(&[1, 2], AccountStatus::Customer, "sales", None)
        .await
        .unwrap();

    assert_eq!(result.success_count, 2);
    for outcome in &result.outcomes {
        assert_matches!(outcome, EntityOutcome::Success { detail, .. } if !detail.audit_recorded);
    }
    assert_eq!(store.status_of(EntityKind::Account, 1).as_deref(), Some("customer"));
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn resurrected_project_can_go_live_again() {
    let (store, lc) = lifecycle();
    store.insert_project(1, "archived", Some(7));

    lc.apply_status_change(1, ProjectStatus::Draft, "ops", Some("client returned"))
        .await
        .unwrap();
    lc.apply_status_change(1, ProjectStatus::LiveCustomer, "ops", None)
        .await
        .unwrap();

    assert_eq!(store.status_of(EntityKind::Project, 1).as_deref(), Some("live-customer"));
    assert_eq!(store.records().len(), 2);
}
