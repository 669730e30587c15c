//! Operator identity extractor.
//!
//! Authentication happens upstream of this service; the gateway forwards the
//! operator's identity in the `x-actor` header and every mutation records it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

pub const ACTOR_HEADER: &str = "x-actor";

/// The operator performing a mutation, taken from the `x-actor` header.
///
/// ```ignore
/// async fn my_handler(actor: Actor) -> AppResult<Json<()>> {
///     tracing::info!(actor = %actor.0, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Missing {ACTOR_HEADER} header")))?;

        Ok(Actor(actor.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<Actor, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(ACTOR_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_trimmed_header() {
        let actor = extract(Some("  ops@example.com ")).await.unwrap();
        assert_eq!(actor, Actor("ops@example.com".into()));
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_rejected() {
        assert!(matches!(extract(None).await, Err(AppError::BadRequest(_))));
        assert!(matches!(extract(Some("   ")).await, Err(AppError::BadRequest(_))));
    }
}
