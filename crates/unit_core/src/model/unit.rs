//! Unit domain model.
//!
//! # Responsibility
//! - Define the canonical `Unit` record and its lifecycle helpers.
//! - Express every field invariant as a named, testable check.
//!
//! # Invariants
//! - `id` is stable and never reused for another unit.
//! - `version` starts at 1 and grows by exactly 1 per mutation.
//! - `updated_at` is never earlier than `created_at`.
//! - Deletion is represented by a `deleted_at` tombstone, not hard delete.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a unit.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UnitId = Uuid;

/// Canonical domain record managed by this core.
///
/// Optional fields use `Option` so that presence checks stay explicit in
/// validation and authorization paths; absence is never encoded as a
/// sentinel value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable global ID, assigned once at construction.
    pub id: UnitId,
    /// Optimistic-concurrency marker; incremented on every mutation.
    pub version: u32,
    /// Unix epoch milliseconds, set once at construction.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
    /// Soft-delete tombstone. `None` means the unit is active.
    pub deleted_at: Option<i64>,
    /// Owning user. `None` means the unit is unowned.
    pub user_id: Option<Uuid>,
    /// Required display name.
    pub name: String,
}

/// Named invariant violations reported by [`Unit::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitValidationError {
    /// `id` is the nil uuid.
    NilId,
    /// `version` is zero.
    VersionNotPositive,
    /// `created_at` is unset (zero or negative).
    MissingCreatedAt,
    /// `updated_at` is unset (zero or negative).
    MissingUpdatedAt,
    /// `updated_at` is earlier than `created_at`.
    UpdatedBeforeCreated,
    /// `deleted_at` is present but holds the zero timestamp.
    ZeroDeletedAt,
    /// `user_id` is present but holds the nil uuid.
    NilUserId,
    /// `name` is empty.
    NameRequired,
}

impl Display for UnitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "unit id must not be the nil uuid"),
            Self::VersionNotPositive => write!(f, "unit version must be at least 1"),
            Self::MissingCreatedAt => write!(f, "unit created_at must be set"),
            Self::MissingUpdatedAt => write!(f, "unit updated_at must be set"),
            Self::UpdatedBeforeCreated => {
                write!(f, "unit updated_at must not be earlier than created_at")
            }
            Self::ZeroDeletedAt => write!(f, "unit deleted_at must not be the zero timestamp"),
            Self::NilUserId => write!(f, "unit user_id must not be the nil uuid"),
            Self::NameRequired => write!(f, "unit name must not be empty"),
        }
    }
}

impl Error for UnitValidationError {}

impl Unit {
    /// Creates a new unit with a generated stable ID.
    ///
    /// `created_at` and `updated_at` share one clock reading, and `version`
    /// starts at 1. No validation is performed here; callers must run
    /// [`Unit::validate`] before persisting.
    pub fn new(user_id: Option<Uuid>, name: impl Into<String>) -> Self {
        let now = epoch_ms_now();

        Self {
            id: Uuid::new_v4(),
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            user_id,
            name: name.into(),
        }
    }

    /// Checks every field invariant and reports the first violation.
    ///
    /// Does not mutate. The checks run in declaration order, so a unit with
    /// several problems surfaces the identity-level one first.
    ///
    /// # Errors
    /// Returns the first [`UnitValidationError`] whose invariant is broken.
    pub fn validate(&self) -> Result<(), UnitValidationError> {
        if self.id.is_nil() {
            return Err(UnitValidationError::NilId);
        }
        if self.version < 1 {
            return Err(UnitValidationError::VersionNotPositive);
        }
        if self.created_at <= 0 {
            return Err(UnitValidationError::MissingCreatedAt);
        }
        if self.updated_at <= 0 {
            return Err(UnitValidationError::MissingUpdatedAt);
        }
        if self.updated_at < self.created_at {
            return Err(UnitValidationError::UpdatedBeforeCreated);
        }
        if self.deleted_at == Some(0) {
            return Err(UnitValidationError::ZeroDeletedAt);
        }
        if self.user_id.is_some_and(|user_id| user_id.is_nil()) {
            return Err(UnitValidationError::NilUserId);
        }
        if self.name.is_empty() {
            return Err(UnitValidationError::NameRequired);
        }

        Ok(())
    }

    /// Records a mutation: bumps `version` by 1 and refreshes `updated_at`.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = epoch_ms_now();
    }

    /// Marks this unit as softly deleted (tombstoned).
    ///
    /// One clock reading is assigned to both `deleted_at` and `updated_at`;
    /// `version` stays unchanged. Calling this twice simply refreshes the
    /// tombstone timestamp.
    pub fn mark_deleted(&mut self) {
        let now = epoch_ms_now();
        self.updated_at = now;
        self.deleted_at = Some(now);
    }

    /// Returns whether this unit carries a soft-delete tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
