//! Domain model for the unit core.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every domain object is identified by a stable `UnitId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod unit;
