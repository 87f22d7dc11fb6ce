//! Unit use-case service.
//!
//! # Responsibility
//! - Validate caller input and authorize mutations before touching storage.
//! - Orchestrate repository calls into use-case level APIs.
//!
//! # Invariants
//! - Precondition failures (`BadParams`) are raised before any repository
//!   call with side effects; update/delete fetch first because ownership is
//!   only known from stored state.
//! - Repository errors are wrapped with operation context and propagated
//!   unchanged in kind; never retried, logged, or swallowed here.
//! - Every operation writes at most one unit via one repository call.

use crate::model::unit::{Unit, UnitId, UnitValidationError};
use crate::repo::unit_repo::{RepoError, UnitRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-supplied arguments that fail a precondition.
#[derive(Debug)]
pub enum BadParamsError {
    /// A by-ids lookup was requested with an empty id list.
    EmptyIdList,
    /// A name filter was supplied but holds the empty string.
    EmptyNameFilter,
    /// The unit to persist fails field validation.
    Validation(UnitValidationError),
}

impl Display for BadParamsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdList => write!(f, "id list must not be empty"),
            Self::EmptyNameFilter => write!(f, "name filter must not be the empty string"),
            Self::Validation(err) => write!(f, "unit validation failed: {err}"),
        }
    }
}

impl Error for BadParamsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::EmptyIdList | Self::EmptyNameFilter => None,
        }
    }
}

/// Use-case failures surfaced to the immediate caller.
#[derive(Debug)]
pub enum ServiceError {
    /// Caller input failed a precondition; no side effect happened.
    BadParams(BadParamsError),
    /// The stored unit has no owner; mutation is categorically disallowed.
    UserIdMissing(UnitId),
    /// The requesting user is not the recorded owner.
    UserIdMismatch { unit: UnitId, requested_by: Uuid },
    /// A by-id fetch expected exactly one unit and found none.
    NotFound(UnitId),
    /// A by-id fetch expected exactly one unit and found several.
    AmbiguousId { id: UnitId, count: usize },
    /// The persistence boundary failed; `op` names the service operation.
    Repo {
        op: &'static str,
        source: RepoError,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadParams(err) => write!(f, "bad params: {err}"),
            Self::UserIdMissing(id) => write!(f, "unit {id} has no owner recorded"),
            Self::UserIdMismatch { unit, requested_by } => write!(
                f,
                "user {requested_by} is not the recorded owner of unit {unit}"
            ),
            Self::NotFound(id) => write!(f, "unit not found: {id}"),
            Self::AmbiguousId { id, count } => {
                write!(f, "ambiguous lookup: {count} units share id {id}")
            }
            Self::Repo { op, source } => write!(f, "{op}: repository failure: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BadParams(err) => Some(err),
            Self::Repo { source, .. } => Some(source),
            Self::UserIdMissing(_)
            | Self::UserIdMismatch { .. }
            | Self::NotFound(_)
            | Self::AmbiguousId { .. } => None,
        }
    }
}

impl From<BadParamsError> for ServiceError {
    fn from(value: BadParamsError) -> Self {
        Self::BadParams(value)
    }
}

/// Use-case service for unit CRUD, generic over the injected repository.
///
/// Holds no shared mutable state; each call operates on a locally fetched
/// or constructed `Unit` value, and repository calls for one logical
/// operation happen sequentially.
pub struct UnitService<R: UnitRepository> {
    repo: R,
}

impl<R: UnitRepository> UnitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Batch-fetches units by id.
    ///
    /// # Errors
    /// - `BadParams(EmptyIdList)` when `ids` is empty; no repository call
    ///   is issued.
    /// - `Repo` wrapping any repository failure.
    pub fn get_by_ids(&self, ids: &[UnitId]) -> ServiceResult<Vec<Unit>> {
        if ids.is_empty() {
            return Err(BadParamsError::EmptyIdList.into());
        }

        self.repo
            .get_by_ids(ids)
            .map_err(|source| ServiceError::Repo {
                op: "get_by_ids",
                source,
            })
    }

    /// Lists units for one owner, optionally narrowed by a name substring.
    ///
    /// Filtering happens repository-side; substring containment is the
    /// match semantics.
    ///
    /// # Errors
    /// - `BadParams(EmptyNameFilter)` when a filter is supplied but empty;
    ///   no repository call is issued.
    /// - `Repo` wrapping any repository failure.
    pub fn get_all(&self, owner: Uuid, name_filter: Option<&str>) -> ServiceResult<Vec<Unit>> {
        if name_filter == Some("") {
            return Err(BadParamsError::EmptyNameFilter.into());
        }

        self.repo
            .get_all(owner, name_filter)
            .map_err(|source| ServiceError::Repo {
                op: "get_all",
                source,
            })
    }

    /// Constructs, validates, and persists a new unit bound to `user_id`.
    ///
    /// # Errors
    /// - `BadParams(Validation)` when the constructed unit fails field
    ///   validation; no repository call is issued.
    /// - `Repo` wrapping any repository failure.
    pub fn create(&self, user_id: Option<Uuid>, name: impl Into<String>) -> ServiceResult<Unit> {
        let unit = Unit::new(user_id, name);
        unit.validate().map_err(BadParamsError::Validation)?;

        self.repo
            .create(&unit)
            .map_err(|source| ServiceError::Repo {
                op: "create",
                source,
            })?;

        Ok(unit)
    }

    /// Renames the unit `id` on behalf of `requesting_user`.
    ///
    /// Fetches the stored unit first, because ownership can only be checked
    /// against stored state. Bumps the version, assigns the new name,
    /// re-validates, and persists.
    ///
    /// # Errors
    /// - `NotFound` / `AmbiguousId` when the fetch does not yield exactly
    ///   one unit.
    /// - `UserIdMissing` when the stored unit is unowned.
    /// - `UserIdMismatch` when `requesting_user` is not the stored owner.
    /// - `BadParams(Validation)` when the mutated unit fails validation.
    /// - `Repo` wrapping any repository failure.
    pub fn update(
        &self,
        id: UnitId,
        requesting_user: Uuid,
        name: impl Into<String>,
    ) -> ServiceResult<Unit> {
        let mut unit = self.fetch_one(id, "update")?;

        let Some(owner) = unit.user_id else {
            return Err(ServiceError::UserIdMissing(id));
        };
        if owner != requesting_user {
            return Err(ServiceError::UserIdMismatch {
                unit: id,
                requested_by: requesting_user,
            });
        }

        unit.touch();
        unit.name = name.into();
        unit.validate().map_err(BadParamsError::Validation)?;

        self.repo
            .update(&unit)
            .map_err(|source| ServiceError::Repo {
                op: "update",
                source,
            })?;

        Ok(unit)
    }

    /// Soft-deletes the unit `id` and persists the tombstone.
    ///
    /// No ownership check is performed here; the delete contract carries no
    /// requesting-user parameter.
    ///
    /// # Errors
    /// - `NotFound` / `AmbiguousId` when the fetch does not yield exactly
    ///   one unit.
    /// - `Repo` wrapping any repository failure.
    pub fn delete(&self, id: UnitId) -> ServiceResult<Unit> {
        let mut unit = self.fetch_one(id, "delete")?;

        unit.mark_deleted();

        self.repo
            .update(&unit)
            .map_err(|source| ServiceError::Repo {
                op: "delete",
                source,
            })?;

        Ok(unit)
    }

    /// Fetches the unit `id`, requiring exactly one stored row.
    fn fetch_one(&self, id: UnitId, op: &'static str) -> ServiceResult<Unit> {
        let mut units = self
            .repo
            .get_by_ids(&[id])
            .map_err(|source| ServiceError::Repo { op, source })?;

        match units.len() {
            0 => Err(ServiceError::NotFound(id)),
            1 => Ok(units.remove(0)),
            count => Err(ServiceError::AmbiguousId { id, count }),
        }
    }
}
