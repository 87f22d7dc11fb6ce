use std::cell::Cell;
use unit_core::db::open_db_in_memory;
use unit_core::{
    BadParamsError, RepoError, RepoResult, ServiceError, SqliteUnitRepository, Unit,
    UnitRepository, UnitService, UnitValidationError,
};
use uuid::Uuid;

/// Repository double that counts calls and replays canned fetch results.
struct ScriptedRepo {
    calls: Cell<usize>,
    fetch_result: Vec<Unit>,
    fail_writes: bool,
}

impl ScriptedRepo {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
            fetch_result: Vec::new(),
            fail_writes: false,
        }
    }

    fn with_fetch_result(units: Vec<Unit>) -> Self {
        Self {
            fetch_result: units,
            ..Self::new()
        }
    }

    fn record_call(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl UnitRepository for ScriptedRepo {
    fn get_by_ids(&self, _ids: &[Uuid]) -> RepoResult<Vec<Unit>> {
        self.record_call();
        Ok(self.fetch_result.clone())
    }

    fn get_all(&self, _owner: Uuid, _name_filter: Option<&str>) -> RepoResult<Vec<Unit>> {
        self.record_call();
        Ok(self.fetch_result.clone())
    }

    fn create(&self, _unit: &Unit) -> RepoResult<()> {
        self.record_call();
        if self.fail_writes {
            return Err(RepoError::InvalidData("scripted write failure".to_string()));
        }
        Ok(())
    }

    fn update(&self, _unit: &Unit) -> RepoResult<()> {
        self.record_call();
        if self.fail_writes {
            return Err(RepoError::InvalidData("scripted write failure".to_string()));
        }
        Ok(())
    }
}

#[test]
fn get_by_ids_with_empty_list_fails_without_repo_call() {
    let repo = ScriptedRepo::new();
    let service = UnitService::new(&repo);

    let err = service.get_by_ids(&[]).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadParams(BadParamsError::EmptyIdList)
    ));
    // The precondition must trip before storage is consulted.
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn get_all_with_empty_filter_fails_without_repo_call() {
    let repo = ScriptedRepo::new();
    let service = UnitService::new(&repo);

    let err = service.get_all(Uuid::new_v4(), Some("")).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadParams(BadParamsError::EmptyNameFilter)
    ));
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn get_all_without_filter_delegates() {
    let owner = Uuid::new_v4();
    let stored = Unit::new(Some(owner), "kept");
    let service = UnitService::new(ScriptedRepo::with_fetch_result(vec![stored.clone()]));

    let listed = service.get_all(owner, None).unwrap();
    assert_eq!(listed, vec![stored]);
}

#[test]
fn create_with_empty_name_fails_without_repo_call() {
    let repo = ScriptedRepo::new();
    let service = UnitService::new(&repo);

    let err = service.create(Some(Uuid::new_v4()), "").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadParams(BadParamsError::Validation(
            UnitValidationError::NameRequired
        ))
    ));
    assert_eq!(repo.calls.get(), 0);
}

#[test]
fn create_wraps_repository_failures_with_operation_context() {
    let mut repo = ScriptedRepo::new();
    repo.fail_writes = true;
    let service = UnitService::new(repo);

    let err = service.create(None, "doomed").unwrap_err();
    match err {
        ServiceError::Repo { op, source } => {
            assert_eq!(op, "create");
            assert!(matches!(source, RepoError::InvalidData(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_missing_unit_fails_not_found() {
    let service = UnitService::new(ScriptedRepo::new());
    let id = Uuid::new_v4();

    let err = service.update(id, Uuid::new_v4(), "renamed").unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(missing) if missing == id));
}

#[test]
fn update_with_ambiguous_fetch_fails() {
    let unit = Unit::new(Some(Uuid::new_v4()), "twin");
    let service = UnitService::new(ScriptedRepo::with_fetch_result(vec![
        unit.clone(),
        unit.clone(),
    ]));

    let err = service.update(unit.id, Uuid::new_v4(), "renamed").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AmbiguousId { id, count: 2 } if id == unit.id
    ));
}

#[test]
fn update_unowned_unit_fails_user_id_missing() {
    let unit = Unit::new(None, "orphan");
    let service = UnitService::new(ScriptedRepo::with_fetch_result(vec![unit.clone()]));

    let err = service.update(unit.id, Uuid::new_v4(), "renamed").unwrap_err();
    assert!(matches!(err, ServiceError::UserIdMissing(id) if id == unit.id));
}

#[test]
fn update_by_non_owner_fails_user_id_mismatch() {
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let unit = Unit::new(Some(owner), "guarded");
    let service = UnitService::new(ScriptedRepo::with_fetch_result(vec![unit.clone()]));

    let err = service.update(unit.id, intruder, "renamed").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UserIdMismatch { unit: id, requested_by }
            if id == unit.id && requested_by == intruder
    ));
}

#[test]
fn update_renaming_to_empty_fails_validation() {
    let owner = Uuid::new_v4();
    let unit = Unit::new(Some(owner), "named");
    let service = UnitService::new(ScriptedRepo::with_fetch_result(vec![unit.clone()]));

    let err = service.update(unit.id, owner, "").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadParams(BadParamsError::Validation(
            UnitValidationError::NameRequired
        ))
    ));
}

#[test]
fn create_update_delete_scenario_over_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let service = UnitService::new(SqliteUnitRepository::new(&conn));

    let owner = Uuid::new_v4();
    let created = service.create(Some(owner), "Alpha").unwrap();
    assert_eq!(created.version, 1);
    assert_eq!(created.name, "Alpha");
    assert_eq!(created.user_id, Some(owner));

    let updated = service.update(created.id, owner, "Beta").unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.name, "Beta");

    // A stranger's rename is rejected and stored state stays untouched.
    let intruder = Uuid::new_v4();
    let err = service.update(created.id, intruder, "Gamma").unwrap_err();
    assert!(matches!(err, ServiceError::UserIdMismatch { .. }));
    let stored = service.get_by_ids(&[created.id]).unwrap();
    assert_eq!(stored[0].name, "Beta");
    assert_eq!(stored[0].version, 2);

    let deleted = service.delete(created.id).unwrap();
    assert!(deleted.deleted_at.is_some());
    assert_eq!(deleted.version, 2);

    // Soft-deleted units stay fetchable by id.
    let stored = service.get_by_ids(&[created.id]).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].deleted_at, deleted.deleted_at);
}

#[test]
fn delete_missing_unit_fails_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = UnitService::new(SqliteUnitRepository::new(&conn));

    let id = Uuid::new_v4();
    let err = service.delete(id).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(missing) if missing == id));
}

#[test]
fn delete_requires_no_ownership() {
    let conn = open_db_in_memory().unwrap();
    let service = UnitService::new(SqliteUnitRepository::new(&conn));

    let created = service.create(Some(Uuid::new_v4()), "owned").unwrap();
    let deleted = service.delete(created.id).unwrap();
    assert!(deleted.is_deleted());
}
