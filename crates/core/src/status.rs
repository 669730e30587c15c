//! Closed vocabularies for project and account lifecycle fields.
//!
//! The string values are persisted verbatim in the `projects` and `accounts`
//! tables and rendered by the admin console as dropdown choices and badges,
//! so they must stay stable. Each vocabulary is declared once here and
//! consumed by the transition guard, the validators, the repositories and
//! the HTTP layer.

use serde::{Deserialize, Serialize};

/// Declare a closed vocabulary enum with its persisted value and display label.
///
/// Generates `ALL`, `as_str`, `label`, `from_str_value`, plus `Display`,
/// `FromStr` and serde impls keyed on the persisted value.
macro_rules! define_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($noun:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant ),+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The persisted string value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            /// Human-readable label for display.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Convert from a persisted string value.
            pub fn from_str_value(s: &str) -> Result<Self, String> {
                match s {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(format!(
                        "Invalid {} '{s}'. Must be one of: {}",
                        $noun,
                        [$( $value ),+].join(", ")
                    )),
                }
            }

            /// Value/label pairs for UI dropdowns.
            pub fn vocabulary() -> Vec<VocabularyEntry> {
                Self::ALL
                    .iter()
                    .map(|v| VocabularyEntry {
                        value: v.as_str(),
                        label: v.label(),
                    })
                    .collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_str_value(s)
            }
        }
    };
}

/// A single value/label pair of a closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VocabularyEntry {
    pub value: &'static str,
    pub label: &'static str,
}

define_vocabulary! {
    /// The two lifecycle-governed record types.
    EntityKind ("entity kind") {
        Project => ("project", "Project"),
        Account => ("account", "Account"),
    }
}

define_vocabulary! {
    /// Business lifecycle of a customer website.
    ProjectStatus ("project status") {
        /// Entry point; every project is created here.
        Draft => ("draft", "Draft"),
        TemplateInternal => ("template-internal", "Internal Template"),
        TemplatePublic => ("template-public", "Public Template"),
        ProspectStaging => ("prospect-staging", "Prospect Staging"),
        LiveCustomer => ("live-customer", "Live"),
        PausedMaintenance => ("paused-maintenance", "Paused for Maintenance"),
        /// Terminal until resurrected to `draft`.
        Archived => ("archived", "Archived"),
    }
}

define_vocabulary! {
    /// What kind of site a project is.
    ProjectType ("project type") {
        MainSite => ("main_site", "Main Site"),
        LandingPage => ("landing_page", "Landing Page"),
        /// The only type allowed to exist without an owning account.
        Template => ("template", "Template"),
    }
}

define_vocabulary! {
    /// Hosting deployment state, independent of the business lifecycle.
    DeploymentStatus ("deployment status") {
        NotDeployed => ("not_deployed", "Not Deployed"),
        Deploying => ("deploying", "Deploying"),
        Deployed => ("deployed", "Deployed"),
        Failed => ("failed", "Failed"),
    }
}

define_vocabulary! {
    /// Maturity ladder of a customer organization.
    AccountStatus ("account status") {
        Prospect => ("prospect", "Prospect"),
        Customer => ("customer", "Customer"),
        Inactive => ("inactive", "Inactive"),
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        Self::NotDeployed
    }
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::Prospect
    }
}

impl ProjectType {
    /// Whether a project of this type must reference an owning account.
    pub fn requires_account(self) -> bool {
        !matches!(self, Self::Template)
    }
}

/// Every closed vocabulary, keyed by field name. Served to the admin console.
#[derive(Debug, Clone, Serialize)]
pub struct Vocabularies {
    pub entity_kinds: Vec<VocabularyEntry>,
    pub project_statuses: Vec<VocabularyEntry>,
    pub project_types: Vec<VocabularyEntry>,
    pub deployment_statuses: Vec<VocabularyEntry>,
    pub account_statuses: Vec<VocabularyEntry>,
}

impl Vocabularies {
    pub fn all() -> Self {
        Self {
            entity_kinds: EntityKind::vocabulary(),
            project_statuses: ProjectStatus::vocabulary(),
            project_types: ProjectType::vocabulary(),
            deployment_statuses: DeploymentStatus::vocabulary(),
            account_statuses: AccountStatus::vocabulary(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
