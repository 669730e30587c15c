//! Lifecycle core for the SiteOps admin console.
//!
//! Pure domain logic (status vocabularies, transition rules, payload
//! validation) plus the coordinators that apply single and bulk status
//! changes through a [`store::LifecycleStore`]. Has no knowledge of HTTP or
//! SQL; `siteops-db` provides the Postgres store and `siteops-api` the HTTP
//! surface.

pub mod audit;
pub mod bulk;
pub mod error;
pub mod mutation;
pub mod rules;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;
