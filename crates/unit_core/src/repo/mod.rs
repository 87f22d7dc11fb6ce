//! Repository layer abstraction and persistence implementations.
//!
//! # Responsibility
//! - Define the use-case oriented data access contract.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Unit::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod unit_repo;
