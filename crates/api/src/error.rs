use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use siteops_core::error::CoreError;
use siteops_core::mutation::MutationError;
use siteops_core::validation::ValidationReport;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`MutationError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `siteops_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A rejected or failed lifecycle mutation.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// A payload that failed validation.
    #[error("Validation failed: {0}")]
    Invalid(ValidationReport),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<ValidationReport> for AppError {
    fn from(report: ValidationReport) -> Self {
        AppError::Invalid(report)
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn core_error_parts(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

fn validation_response(report: &ValidationReport) -> Response {
    let body = json!({
        "error": report.to_string(),
        "code": "VALIDATION_ERROR",
        "field_errors": report.field_errors,
        "form_errors": report.form_errors,
    });
    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => core_error_parts(core),

            // --- Lifecycle mutations ---
            AppError::Mutation(err) => match err {
                MutationError::Validation(report) => return validation_response(report),
                MutationError::TransitionDenied { reason } => {
                    (StatusCode::CONFLICT, "TRANSITION_DENIED", reason.clone())
                }
                MutationError::DeletionDenied { reason } => {
                    (StatusCode::CONFLICT, "DELETION_DENIED", reason.clone())
                }
                MutationError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                MutationError::UnknownStatus { .. } | MutationError::Persistence(_) => {
                    tracing::error!(error = %err, "Lifecycle persistence failure");
                    internal()
                }
            },

            AppError::Invalid(report) => return validation_response(report),

            // --- Database errors ---
            AppError::Database(err) => match constraint_violation(err) {
                Some(core) => core_error_parts(&core),
                None => classify_sqlx_error(err),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a Postgres constraint violation onto the domain error it represents.
///
/// Foreign key violations (`23503`) become [`CoreError::Conflict`]: a
/// referenced account is missing, or a deleted row is still referenced.
/// Check violations (`23514`) become [`CoreError::Validation`].
pub fn constraint_violation(err: &sqlx::Error) -> Option<CoreError> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let constraint = db_err.constraint().unwrap_or("unknown");
    match db_err.code().as_deref() {
        Some("23503") => Some(CoreError::Conflict(format!(
            "Referenced record is missing or still in use: {constraint}"
        ))),
        Some("23514") => Some(CoreError::Validation(format!(
            "Value violates check constraint: {constraint}"
        ))),
        _ => None,
    }
}

/// Classify a non-constraint sqlx error into an HTTP status, error code,
/// and message. `RowNotFound` maps to 404; everything else maps to 500 with
/// a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
