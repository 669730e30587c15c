//! Structural validation of create/update payloads.
//!
//! Runs before any transition logic. Field rules are declared with
//! `validator` derives; required-combination rules (a non-template project
//! must have an account) are form-level and checked by hand. A payload only
//! reaches the repositories wrapped in [`Validated`], so a failed validation
//! always blocks the write.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::status::{AccountStatus, DeploymentStatus, ProjectType};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Limits and patterns
// ---------------------------------------------------------------------------

/// Maximum length of a free-text transition reason.
pub const MAX_REASON_LEN: usize = 500;

/// Maximum number of entities in one bulk request.
pub const MAX_BULK_SELECTION: usize = 500;

/// Letters, digits, spaces and `& . , ' -`.
static BUSINESS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N} &.,'\-]+$").expect("valid business name regex"));

/// Hostname shape: dot-separated labels, no scheme, no path.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("valid domain regex")
});

pub const FORM_ERROR_ACCOUNT_REQUIRED: &str =
    "An account is required unless the project type is template";

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Result of validating one payload.
///
/// `field_errors` holds at most one message per field; `form_errors` holds
/// problems with combinations of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub field_errors: BTreeMap<String, String>,
    pub form_errors: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            field_errors: BTreeMap::new(),
            form_errors: Vec::new(),
        }
    }
}

impl ValidationReport {
    /// Build a report from `validator` field errors.
    pub fn from_validator(result: Result<(), ValidationErrors>) -> Self {
        let mut report = Self::default();
        if let Err(errors) = result {
            for (field, errs) in errors.field_errors() {
                if let Some(first) = errs.first() {
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", first.code));
                    report.add_field_error(field.to_string(), message);
                }
            }
        }
        report
    }

    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors.entry(field.into()).or_insert_with(|| message.into());
        self.valid = false;
    }

    pub fn add_form_error(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
        self.valid = false;
    }

    /// Wrap `value` as [`Validated`] if the report is clean.
    pub fn into_result<T>(self, value: T) -> Result<Validated<T>, ValidationReport> {
        if self.valid {
            Ok(Validated(value))
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .form_errors
            .iter()
            .cloned()
            .chain(
                self.field_errors
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}")),
            )
            .collect();
        f.write_str(&messages.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Validated wrapper
// ---------------------------------------------------------------------------

/// A payload that passed validation. Only constructible through
/// [`ValidatePayload::validated`].
#[derive(Debug, Clone)]
pub struct Validated<T>(T);

impl<T> Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Payloads with a structural validation report.
pub trait ValidatePayload: Sized {
    fn report(&self) -> ValidationReport;

    fn validated(self) -> Result<Validated<Self>, ValidationReport> {
        self.report().into_result(self)
    }
}

fn check_not_blank(report: &mut ValidationReport, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.is_empty() && v.trim().is_empty() {
            report.add_field_error(field, "Must not be blank");
        }
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Payload for creating a project.
///
/// Projects are always created in `draft`; any other status is reached
/// through a guarded transition. A payload naming a `status` is rejected.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    #[validate(length(min = 1, max = 200, message = "Name is required (at most 200 characters)"))]
    pub name: String,
    pub project_type: ProjectType,
    pub account_id: Option<DbId>,
    /// Defaults to `not_deployed`.
    #[serde(default)]
    pub deployment_status: Option<DeploymentStatus>,
}

impl ValidatePayload for NewProject {
    fn report(&self) -> ValidationReport {
        let mut report = ValidationReport::from_validator(self.validate());
        check_not_blank(&mut report, "name", Some(self.name.as_str()));
        if self.project_type.requires_account() && self.account_id.is_none() {
            report.add_form_error(FORM_ERROR_ACCOUNT_REQUIRED);
        }
        report
    }
}

/// Partial update of a project's non-status fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub project_type: Option<ProjectType>,
    pub account_id: Option<DbId>,
    pub deployment_status: Option<DeploymentStatus>,
}

impl ProjectChanges {
    /// Validate the changes against the project's current type and account.
    pub fn report_against(
        &self,
        current_type: ProjectType,
        current_account: Option<DbId>,
    ) -> ValidationReport {
        let mut report = ValidationReport::from_validator(self.validate());
        check_not_blank(&mut report, "name", self.name.as_deref());
        let resulting_type = self.project_type.unwrap_or(current_type);
        let resulting_account = self.account_id.or(current_account);
        if resulting_type.requires_account() && resulting_account.is_none() {
            report.add_form_error(FORM_ERROR_ACCOUNT_REQUIRED);
        }
        report
    }

    pub fn validated_against(
        self,
        current_type: ProjectType,
        current_account: Option<DbId>,
    ) -> Result<Validated<Self>, ValidationReport> {
        self.report_against(current_type, current_account)
            .into_result(self)
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Payload for creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(
        length(min = 1, max = 200, message = "Business name is required (at most 200 characters)"),
        regex(
            path = *BUSINESS_NAME_RE,
            message = "Business name may only contain letters, digits, spaces and & . , ' -"
        )
    )]
    pub business_name: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(regex(path = *DOMAIN_RE, message = "Must be a hostname such as example.com"))]
    pub domain: Option<String>,
    pub notes: Option<String>,
    /// Defaults to `prospect`.
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

impl ValidatePayload for NewAccount {
    fn report(&self) -> ValidationReport {
        let mut report = ValidationReport::from_validator(self.validate());
        check_not_blank(&mut report, "business_name", Some(self.business_name.as_str()));
        report
    }
}

/// Optional account fields that an update can reset to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearableField {
    Domain,
    Notes,
}

impl ClearableField {
    fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Notes => "notes",
        }
    }
}

/// Partial update of an account's non-status fields.
///
/// Absent or `null` fields keep their stored value. To empty `domain` or
/// `notes`, name them in `clear`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AccountChanges {
    #[validate(
        length(min = 1, max = 200, message = "Business name must be 1-200 characters"),
        regex(
            path = *BUSINESS_NAME_RE,
            message = "Business name may only contain letters, digits, spaces and & . , ' -"
        )
    )]
    pub business_name: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[validate(regex(path = *DOMAIN_RE, message = "Must be a hostname such as example.com"))]
    pub domain: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub clear: Vec<ClearableField>,
}

impl AccountChanges {
    pub fn clears(&self, field: ClearableField) -> bool {
        self.clear.contains(&field)
    }
}

impl ValidatePayload for AccountChanges {
    fn report(&self) -> ValidationReport {
        let mut report = ValidationReport::from_validator(self.validate());
        check_not_blank(&mut report, "business_name", self.business_name.as_deref());
        for field in [ClearableField::Domain, ClearableField::Notes] {
            let supplied = match field {
                ClearableField::Domain => self.domain.is_some(),
                ClearableField::Notes => self.notes.is_some(),
            };
            if supplied && self.clears(field) {
                report.add_field_error(field.name(), "Cannot both set and clear a field");
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Status change requests
// ---------------------------------------------------------------------------

/// Validate the optional free-text reason attached to a transition.
pub fn validate_reason(reason: Option<&str>) -> ValidationReport {
    let mut report = ValidationReport::default();
    if let Some(r) = reason {
        if r.chars().count() > MAX_REASON_LEN {
            report.add_field_error(
                "reason",
                format!("Reason must be at most {MAX_REASON_LEN} characters"),
            );
        }
    }
    report
}

/// Validate the size of a bulk selection.
pub fn validate_selection(ids: &[DbId]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if ids.is_empty() {
        report.add_field_error("ids", "Select at least one entity");
    } else if ids.len() > MAX_BULK_SELECTION {
        report.add_field_error(
            "ids",
            format!("At most {MAX_BULK_SELECTION} entities can be changed at once"),
        );
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
