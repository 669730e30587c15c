//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod project_repo;
pub mod transition_record_repo;

pub use account_repo::AccountRepo;
pub use project_repo::ProjectRepo;
pub use transition_record_repo::TransitionRecordRepo;
