//! Row structs and update DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row. Status-like columns are kept as their persisted strings;
//! typed accessors parse them into the core vocabularies. Create payloads
//! live in `siteops_core::validation` so they cannot skip validation.

pub mod account;
pub mod project;
pub mod transition_record;
