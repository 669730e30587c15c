//! Transition rule tables and the transition guard.
//!
//! Each entity kind owns one immutable [`TransitionTable`]: an ordered list of
//! rules evaluated first-match-wins, falling through to a default allow. The
//! [`TransitionGuard`] builds both tables once and is the only place a
//! `(current, target)` pair is decided. It is pure and never touches storage.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::status::{AccountStatus, EntityKind, ProjectStatus};

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Outcome of a guard check. `reason` is set only on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// Which targets a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMatch<S> {
    Any,
    Exactly(S),
    AnyExcept(S),
}

impl<S: PartialEq> TargetMatch<S> {
    fn matches(&self, target: &S) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(s) => s == target,
            Self::AnyExcept(s) => s != target,
        }
    }
}

/// What a matching rule decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule<S> {
    pub from: S,
    pub target: TargetMatch<S>,
    pub verdict: Verdict,
}

/// Ordered rules for one entity kind. Unmatched pairs are allowed.
#[derive(Debug, Clone)]
pub struct TransitionTable<S> {
    rules: Vec<Rule<S>>,
}

impl<S: LifecycleStatus> TransitionTable<S> {
    pub fn new(rules: Vec<Rule<S>>) -> Self {
        Self { rules }
    }

    /// Decide whether `current -> target` is permitted.
    pub fn check(&self, current: S, target: S) -> TransitionDecision {
        let matched = self
            .rules
            .iter()
            .find(|rule| rule.from == current && rule.target.matches(&target));

        match matched.map(|rule| rule.verdict) {
            Some(Verdict::Deny(reason)) => TransitionDecision::deny(reason),
            Some(Verdict::Allow) | None => TransitionDecision::allow(),
        }
    }

    /// Statuses reachable from `current`, excluding `current` itself.
    pub fn valid_targets(&self, current: S) -> Vec<S> {
        S::all()
            .iter()
            .copied()
            .filter(|target| *target != current && self.check(current, *target).allowed)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Project rules
// ---------------------------------------------------------------------------

pub const REASON_ARCHIVED_RESTORE_ONLY: &str =
    "Archived projects can only be restored to draft";

pub const REASON_LIVE_REQUIRES_MAINTENANCE: &str =
    "Live projects must be moved to paused-maintenance before they can be archived";

fn project_table() -> TransitionTable<ProjectStatus> {
    use ProjectStatus::*;

    TransitionTable::new(vec![
        Rule {
            from: Draft,
            target: TargetMatch::Any,
            verdict: Verdict::Allow,
        },
        Rule {
            from: Archived,
            target: TargetMatch::AnyExcept(Draft),
            verdict: Verdict::Deny(REASON_ARCHIVED_RESTORE_ONLY),
        },
        Rule {
            from: LiveCustomer,
            target: TargetMatch::Exactly(Archived),
            verdict: Verdict::Deny(REASON_LIVE_REQUIRES_MAINTENANCE),
        },
    ])
}

// ---------------------------------------------------------------------------
// Account rules
// ---------------------------------------------------------------------------

pub const REASON_INACTIVE_REQUIRES_REVIEW: &str =
    "Inactive accounts must be moved back to prospect for re-review before becoming customers";

pub const REASON_CUSTOMER_NO_DOWNGRADE: &str =
    "Customer accounts cannot be moved back to prospect under the maturity ladder policy";

/// How strictly account status moves are held to the maturity ladder.
///
/// Two call sites of the admin console historically disagreed on whether
/// `customer -> prospect` is allowed; both behaviors are kept selectable until
/// product settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTransitionPolicy {
    /// Blocks `customer -> prospect` in addition to `inactive -> customer`.
    #[default]
    MaturityLadder,
    /// Only blocks `inactive -> customer`.
    Permissive,
}

impl AccountTransitionPolicy {
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            "maturity_ladder" => Ok(Self::MaturityLadder),
            "permissive" => Ok(Self::Permissive),
            _ => Err(format!(
                "Invalid account transition policy '{s}'. Must be one of: maturity_ladder, permissive"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaturityLadder => "maturity_ladder",
            Self::Permissive => "permissive",
        }
    }
}

fn account_table(policy: AccountTransitionPolicy) -> TransitionTable<AccountStatus> {
    use AccountStatus::*;

    let mut rules = vec![Rule {
        from: Inactive,
        target: TargetMatch::Exactly(Customer),
        verdict: Verdict::Deny(REASON_INACTIVE_REQUIRES_REVIEW),
    }];

    if policy == AccountTransitionPolicy::MaturityLadder {
        rules.push(Rule {
            from: Customer,
            target: TargetMatch::Exactly(Prospect),
            verdict: Verdict::Deny(REASON_CUSTOMER_NO_DOWNGRADE),
        });
    }

    TransitionTable::new(rules)
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Decides every status transition for both entity kinds.
#[derive(Debug, Clone)]
pub struct TransitionGuard {
    projects: TransitionTable<ProjectStatus>,
    accounts: TransitionTable<AccountStatus>,
    account_policy: AccountTransitionPolicy,
}

impl TransitionGuard {
    pub fn new(account_policy: AccountTransitionPolicy) -> Self {
        Self {
            projects: project_table(),
            accounts: account_table(account_policy),
            account_policy,
        }
    }

    pub fn account_policy(&self) -> AccountTransitionPolicy {
        self.account_policy
    }

    pub fn can_transition<S: LifecycleStatus>(&self, current: S, target: S) -> TransitionDecision {
        S::table(self).check(current, target)
    }

    pub fn valid_targets<S: LifecycleStatus>(&self, current: S) -> Vec<S> {
        S::table(self).valid_targets(current)
    }
}

impl Default for TransitionGuard {
    fn default() -> Self {
        Self::new(AccountTransitionPolicy::default())
    }
}

// ---------------------------------------------------------------------------
// Lifecycle status trait
// ---------------------------------------------------------------------------

/// A status vocabulary governed by the transition guard.
///
/// Implemented for [`ProjectStatus`] and [`AccountStatus`]; lets the mutation
/// and bulk coordinators stay generic over the entity kind.
pub trait LifecycleStatus:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr<Err = String> + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn all() -> &'static [Self];

    /// The persisted string value.
    fn value(self) -> &'static str;

    fn table(guard: &TransitionGuard) -> &TransitionTable<Self>;

    /// The only state a bulk delete is offered for.
    fn bulk_deletable() -> Self;

    /// Why an entity in this state may not be deleted, if it may not.
    fn deletion_blocker(self) -> Option<&'static str>;

    /// Whether entering this state stamps `converted_at`.
    fn stamps_conversion(self) -> bool {
        false
    }
}

impl LifecycleStatus for ProjectStatus {
    const KIND: EntityKind = EntityKind::Project;

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn value(self) -> &'static str {
        self.as_str()
    }

    fn table(guard: &TransitionGuard) -> &TransitionTable<Self> {
        &guard.projects
    }

    fn bulk_deletable() -> Self {
        Self::Archived
    }

    fn deletion_blocker(self) -> Option<&'static str> {
        match self {
            Self::Draft | Self::Archived => None,
            _ => Some("Only draft or archived projects can be deleted"),
        }
    }
}

impl LifecycleStatus for AccountStatus {
    const KIND: EntityKind = EntityKind::Account;

    fn all() -> &'static [Self] {
        Self::ALL
    }

    fn value(self) -> &'static str {
        self.as_str()
    }

    fn table(guard: &TransitionGuard) -> &TransitionTable<Self> {
        &guard.accounts
    }

    fn bulk_deletable() -> Self {
        Self::Inactive
    }

    fn deletion_blocker(self) -> Option<&'static str> {
        match self {
            Self::Inactive => None,
            Self::Prospect | Self::Customer => Some("Only inactive accounts can be deleted"),
        }
    }

    fn stamps_conversion(self) -> bool {
        self == Self::Customer
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> TransitionGuard {
        TransitionGuard::default()
    }

    // -- Projects -------------------------------------------------------------

    #[test]
    fn draft_may_move_anywhere() {
        let g = guard();
        for target in ProjectStatus::ALL {
            let decision = g.can_transition(ProjectStatus::Draft, *target);
            assert!(decision.allowed, "draft -> {target} should be allowed");
            assert!(decision.reason.is_none());
        }
    }

    #[test]
    fn archived_only_restores_to_draft() {
        let g = guard();
        for target in ProjectStatus::ALL {
            let decision = g.can_transition(ProjectStatus::Archived, *target);
            assert_eq!(decision.allowed, *target == ProjectStatus::Draft, "archived -> {target}");
            if !decision.allowed {
                assert_eq!(decision.reason.as_deref(), Some(REASON_ARCHIVED_RESTORE_ONLY));
            }
        }
    }

    #[test]
    fn live_cannot_be_archived_directly() {
        let decision = guard().can_transition(ProjectStatus::LiveCustomer, ProjectStatus::Archived);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("paused-maintenance"));
    }

    #[test]
    fn live_to_archived_via_maintenance() {
        let g = guard();
        assert!(!g.can_transition(ProjectStatus::LiveCustomer, ProjectStatus::Archived).allowed);
        assert!(
            g.can_transition(ProjectStatus::LiveCustomer, ProjectStatus::PausedMaintenance)
                .allowed
        );
        assert!(
            g.can_transition(ProjectStatus::PausedMaintenance, ProjectStatus::Archived)
                .allowed
        );
    }

    #[test]
    fn unlisted_pairs_default_to_allow() {
        let g = guard();
        assert!(g.can_transition(ProjectStatus::TemplatePublic, ProjectStatus::Archived).allowed);
        assert!(g.can_transition(ProjectStatus::LiveCustomer, ProjectStatus::Draft).allowed);
        assert!(
            g.can_transition(ProjectStatus::ProspectStaging, ProjectStatus::LiveCustomer)
                .allowed
        );
    }

    #[test]
    fn self_pairs_follow_the_same_rules() {
        let g = guard();
        assert!(g.can_transition(ProjectStatus::Draft, ProjectStatus::Draft).allowed);
        assert!(!g.can_transition(ProjectStatus::Archived, ProjectStatus::Archived).allowed);
        assert!(g.can_transition(ProjectStatus::LiveCustomer, ProjectStatus::LiveCustomer).allowed);
        // Deterministic: asking twice yields the same answer.
        assert_eq!(
            g.can_transition(ProjectStatus::Archived, ProjectStatus::Archived),
            g.can_transition(ProjectStatus::Archived, ProjectStatus::Archived),
        );
    }

    #[test]
    fn valid_targets_excludes_current() {
        let g = guard();
        assert_eq!(
            g.valid_targets(ProjectStatus::Archived),
            vec![ProjectStatus::Draft]
        );
        let from_live = g.valid_targets(ProjectStatus::LiveCustomer);
        assert!(!from_live.contains(&ProjectStatus::Archived));
        assert!(!from_live.contains(&ProjectStatus::LiveCustomer));
        assert_eq!(from_live.len(), 5);
    }

    // -- Accounts -------------------------------------------------------------

    #[test]
    fn inactive_cannot_become_customer_under_any_policy() {
        for policy in [
            AccountTransitionPolicy::MaturityLadder,
            AccountTransitionPolicy::Permissive,
        ] {
            let decision = TransitionGuard::new(policy)
                .can_transition(AccountStatus::Inactive, AccountStatus::Customer);
            assert!(!decision.allowed);
            assert!(decision.reason.unwrap().contains("prospect"));
        }
    }

    #[test]
    fn ladder_blocks_customer_downgrade() {
        let g = TransitionGuard::new(AccountTransitionPolicy::MaturityLadder);
        let decision = g.can_transition(AccountStatus::Customer, AccountStatus::Prospect);
        assert!(!decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some(REASON_CUSTOMER_NO_DOWNGRADE));
    }

    #[test]
    fn permissive_allows_customer_downgrade() {
        let g = TransitionGuard::new(AccountTransitionPolicy::Permissive);
        assert!(g.can_transition(AccountStatus::Customer, AccountStatus::Prospect).allowed);
    }

    #[test]
    fn reactivation_goes_through_prospect() {
        let g = guard();
        assert!(g.can_transition(AccountStatus::Inactive, AccountStatus::Prospect).allowed);
        assert!(g.can_transition(AccountStatus::Prospect, AccountStatus::Customer).allowed);
        assert!(g.can_transition(AccountStatus::Customer, AccountStatus::Inactive).allowed);
    }

    #[test]
    fn only_customer_stamps_conversion() {
        assert!(AccountStatus::Customer.stamps_conversion());
        assert!(!AccountStatus::Prospect.stamps_conversion());
        assert!(!ProjectStatus::LiveCustomer.stamps_conversion());
    }

    #[test]
    fn deletion_eligibility() {
        assert!(ProjectStatus::Draft.deletion_blocker().is_none());
        assert!(ProjectStatus::Archived.deletion_blocker().is_none());
        assert!(ProjectStatus::PausedMaintenance.deletion_blocker().is_some());
        assert!(AccountStatus::Inactive.deletion_blocker().is_none());
        assert!(AccountStatus::Customer.deletion_blocker().is_some());
    }

    #[test]
    fn policy_parses_from_config_value() {
        assert_eq!(
            AccountTransitionPolicy::from_str_value("permissive"),
            Ok(AccountTransitionPolicy::Permissive)
        );
        assert!(AccountTransitionPolicy::from_str_value("strict").is_err());
        assert_eq!(AccountTransitionPolicy::default().as_str(), "maturity_ladder");
    }
}
