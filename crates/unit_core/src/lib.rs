//! Core domain logic for the unit service.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::unit::{Unit, UnitId, UnitValidationError};
pub use repo::unit_repo::{RepoError, RepoResult, SqliteUnitRepository, UnitRepository};
pub use service::unit_service::{BadParamsError, ServiceError, ServiceResult, UnitService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
