//! Unit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the persistence capability set consumed by the service layer.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Unit::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `get_all` applies owner equality and name-substring filtering in SQL.

use crate::db::DbError;
use crate::model::unit::{Unit, UnitId, UnitValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const UNIT_SELECT_SQL: &str = "SELECT
    id,
    version,
    created_at,
    updated_at,
    deleted_at,
    user_id,
    name
FROM units";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for unit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(UnitValidationError),
    Db(DbError),
    NotFound(UnitId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "unit not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted unit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<UnitValidationError> for RepoError {
    fn from(value: UnitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence capability set consumed by the use-case layer.
///
/// Implementations decide storage semantics; filtering for `get_all` is a
/// repository responsibility (substring containment on `name`, scoped to
/// the given owner).
pub trait UnitRepository {
    /// Batch fetch by id. Missing ids are simply absent from the result;
    /// callers decide whether that is an error.
    fn get_by_ids(&self, ids: &[UnitId]) -> RepoResult<Vec<Unit>>;
    /// Lists units owned by `owner`, optionally narrowed to names that
    /// contain `name_filter` as a substring.
    fn get_all(&self, owner: Uuid, name_filter: Option<&str>) -> RepoResult<Vec<Unit>>;
    /// Persists a new unit.
    fn create(&self, unit: &Unit) -> RepoResult<()>;
    /// Persists the current state of an existing unit.
    fn update(&self, unit: &Unit) -> RepoResult<()>;
}

impl<R: UnitRepository + ?Sized> UnitRepository for &R {
    fn get_by_ids(&self, ids: &[UnitId]) -> RepoResult<Vec<Unit>> {
        (**self).get_by_ids(ids)
    }

    fn get_all(&self, owner: Uuid, name_filter: Option<&str>) -> RepoResult<Vec<Unit>> {
        (**self).get_all(owner, name_filter)
    }

    fn create(&self, unit: &Unit) -> RepoResult<()> {
        (**self).create(unit)
    }

    fn update(&self, unit: &Unit) -> RepoResult<()> {
        (**self).update(unit)
    }
}

/// SQLite-backed unit repository.
pub struct SqliteUnitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUnitRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UnitRepository for SqliteUnitRepository<'_> {
    fn get_by_ids(&self, ids: &[UnitId]) -> RepoResult<Vec<Unit>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{UNIT_SELECT_SQL} WHERE id IN ({placeholders});");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(
            ids.iter().map(|id| Value::Text(id.to_string())),
        ))?;

        let mut units = Vec::new();
        while let Some(row) = rows.next()? {
            units.push(parse_unit_row(row)?);
        }

        Ok(units)
    }

    fn get_all(&self, owner: Uuid, name_filter: Option<&str>) -> RepoResult<Vec<Unit>> {
        let mut sql = format!("{UNIT_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.to_string())];

        if let Some(substring) = name_filter {
            // instr keeps the match literal; LIKE would need wildcard escaping.
            sql.push_str(" AND instr(name, ?) > 0");
            bind_values.push(Value::Text(substring.to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        let mut units = Vec::new();
        while let Some(row) = rows.next()? {
            units.push(parse_unit_row(row)?);
        }

        Ok(units)
    }

    fn create(&self, unit: &Unit) -> RepoResult<()> {
        unit.validate()?;

        self.conn.execute(
            "INSERT INTO units (
                id,
                version,
                created_at,
                updated_at,
                deleted_at,
                user_id,
                name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                unit.id.to_string(),
                i64::from(unit.version),
                unit.created_at,
                unit.updated_at,
                unit.deleted_at,
                unit.user_id.map(|user_id| user_id.to_string()),
                unit.name.as_str(),
            ],
        )?;

        Ok(())
    }

    fn update(&self, unit: &Unit) -> RepoResult<()> {
        unit.validate()?;

        let changed = self.conn.execute(
            "UPDATE units
             SET
                version = ?1,
                created_at = ?2,
                updated_at = ?3,
                deleted_at = ?4,
                user_id = ?5,
                name = ?6
             WHERE id = ?7;",
            params![
                i64::from(unit.version),
                unit.created_at,
                unit.updated_at,
                unit.deleted_at,
                unit.user_id.map(|user_id| user_id.to_string()),
                unit.name.as_str(),
                unit.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(unit.id));
        }

        Ok(())
    }
}

fn parse_unit_row(row: &Row<'_>) -> RepoResult<Unit> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in units.id"))
    })?;

    let version_raw: i64 = row.get("version")?;
    let version = u32::try_from(version_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid version value `{version_raw}` in units.version"
        ))
    })?;

    let user_id = match row.get::<_, Option<String>>("user_id")? {
        Some(value) => Some(Uuid::parse_str(&value).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{value}` in units.user_id"))
        })?),
        None => None,
    };

    let unit = Unit {
        id,
        version,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
        user_id,
        name: row.get("name")?,
    };
    unit.validate()?;
    Ok(unit)
}
