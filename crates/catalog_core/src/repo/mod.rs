//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the storage capability the services depend on (`CrudRepository`
//!   plus entity-specific lookups).
//! - Translate SQLite outcomes into semantic errors: missing rows, blocked
//!   deletes and dangling relation references.
//!
//! # Invariants
//! - Write paths validate entities before any SQL mutation.
//! - `delete_by_id` reports `NotFound` and `IntegrityViolation` as disjoint
//!   outcomes: a foreign-key failure implies the row exists.
//! - Relation link rows are replaced as a whole on every save.

use crate::db::DbError;
use crate::model::page::{Page, PageRequest, Sort};
use crate::model::relation::Reference;
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod product_repo;
pub mod role_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Entity failed model validation; nothing was written.
    Validation(ValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No row matched the id.
    NotFound { entity: &'static str, id: EntityId },
    /// Delete blocked by rows referencing this one.
    IntegrityViolation { entity: &'static str, id: EntityId },
    /// A reference points to a row that does not exist.
    DanglingReference { entity: &'static str, id: EntityId },
    /// Sort property is not sortable for this entity.
    InvalidSort {
        entity: &'static str,
        property: String,
    },
    /// Persisted data cannot be converted to a valid entity.
    InvalidData(String),
}

impl RepoError {
    /// HTTP-equivalent status code for this error.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::NotFound { .. } => 404,
            Self::IntegrityViolation { .. } => 409,
            Self::DanglingReference { .. } | Self::InvalidSort { .. } => 400,
            Self::Db(_) | Self::InvalidData(_) => 500,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::IntegrityViolation { entity, id } => {
                write!(f, "{entity} {id} is still referenced")
            }
            Self::DanglingReference { entity, id } => {
                write!(f, "referenced {entity} does not exist: {id}")
            }
            Self::InvalidSort { entity, property } => {
                write!(f, "cannot sort {entity} by `{property}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
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

/// Storage capability shared by every catalog entity.
pub trait CrudRepository {
    type Entity: Entity;

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Self::Entity>>;
    /// Unpaged listing ordered by id.
    fn find_all(&self) -> RepoResult<Vec<Self::Entity>>;
    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Self::Entity>>;
    /// Inserts when `id` is `None`, updates otherwise; returns the stored row.
    fn save(&self, entity: &Self::Entity) -> RepoResult<Self::Entity>;
    fn delete_by_id(&self, id: EntityId) -> RepoResult<()>;
    /// Returns a handle to an existing row without loading it.
    ///
    /// Fails with `DanglingReference` when the row does not exist.
    fn get_reference(&self, id: EntityId) -> RepoResult<Reference<Self::Entity>>;

    /// Returns an unchecked handle; existence is verified on save.
    fn lazy_reference(&self, id: EntityId) -> Reference<Self::Entity> {
        Reference::new(id)
    }
}

/// Sortable representation property mapped to its SQL column.
pub(crate) type SortColumn = (&'static str, &'static str);

/// Builds `ORDER BY` for a whitelisted sort, always tie-breaking on id.
pub(crate) fn order_by_clause(
    entity: &'static str,
    sort: Option<&Sort>,
    columns: &[SortColumn],
) -> RepoResult<String> {
    let Some(sort) = sort else {
        return Ok("ORDER BY id ASC".to_string());
    };

    let column = columns
        .iter()
        .find(|(property, _)| *property == sort.property)
        .map(|(_, column)| *column)
        .ok_or_else(|| RepoError::InvalidSort {
            entity,
            property: sort.property.clone(),
        })?;

    if column == "id" {
        return Ok(format!("ORDER BY id {}", sort.direction.as_sql()));
    }
    Ok(format!(
        "ORDER BY {column} {}, id ASC",
        sort.direction.as_sql()
    ))
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count in {table}")))
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Eager existence probe behind `CrudRepository::get_reference`.
pub(crate) fn existing_reference<T>(
    conn: &Connection,
    table: &str,
    entity: &'static str,
    id: EntityId,
) -> RepoResult<Reference<T>> {
    if row_exists(conn, table, id)? {
        Ok(Reference::new(id))
    } else {
        Err(RepoError::DanglingReference { entity, id })
    }
}

/// Deletes one row, separating "no row" from "still referenced".
pub(crate) fn delete_row(
    conn: &Connection,
    table: &str,
    entity: &'static str,
    id: EntityId,
) -> RepoResult<()> {
    let changed = conn
        .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                RepoError::IntegrityViolation { entity, id }
            } else {
                RepoError::from(err)
            }
        })?;

    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// Many-to-many association table owned by one side.
pub(crate) struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
    pub target_entity: &'static str,
}

impl LinkTable {
    /// Target ids linked to `owner_id`, ascending.
    pub fn load_ids(&self, conn: &Connection, owner_id: EntityId) -> RepoResult<Vec<EntityId>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY {target} ASC;",
            target = self.target_column,
            table = self.table,
            owner = self.owner_column,
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    /// Clears all links of `owner_id` and rebuilds them from `target_ids`.
    ///
    /// Must run inside a write transaction so a dangling id leaves the
    /// previous links intact.
    pub fn replace(
        &self,
        conn: &Connection,
        owner_id: EntityId,
        target_ids: &[EntityId],
    ) -> RepoResult<()> {
        conn.execute(
            &format!(
                "DELETE FROM {table} WHERE {owner} = ?1;",
                table = self.table,
                owner = self.owner_column,
            ),
            [owner_id],
        )?;

        let insert_sql = format!(
            "INSERT OR IGNORE INTO {table} ({owner}, {target}) VALUES (?1, ?2);",
            table = self.table,
            owner = self.owner_column,
            target = self.target_column,
        );
        for target_id in target_ids {
            if !row_exists(conn, self.target_table, *target_id)? {
                return Err(RepoError::DanglingReference {
                    entity: self.target_entity,
                    id: *target_id,
                });
            }
            conn.execute(&insert_sql, params![owner_id, target_id])?;
        }
        Ok(())
    }
}

/// Builds `IN (?, ?, ...)` placeholders for `count` values.
pub(crate) fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
