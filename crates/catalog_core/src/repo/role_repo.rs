//! Role repository contract and SQLite implementation.

use crate::model::page::{Page, PageRequest};
use crate::model::relation::Reference;
use crate::model::role::{Role, RoleId};
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};
use crate::repo::{
    count_rows, delete_row, existing_reference, in_placeholders, order_by_clause, CrudRepository,
    RepoError, RepoResult, SortColumn,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const ROLE_SELECT_SQL: &str = "SELECT id, authority FROM roles";
const ROLE_SORT_COLUMNS: &[SortColumn] = &[("id", "id"), ("authority", "authority")];

/// Role storage capability.
pub trait RoleRepository: CrudRepository<Entity = Role> {
    /// Loads the given roles ordered by id; unknown ids are skipped.
    fn find_all_by_ids(&self, ids: &[RoleId]) -> RepoResult<Vec<Role>>;
}

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, id: RoleId) -> RepoResult<Option<Role>> {
        self.conn
            .query_row(
                &format!("{ROLE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_role_row,
            )
            .optional()
            .map_err(RepoError::from)
    }

    fn query(&self, sql: &str, values: &[i64]) -> RepoResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }
}

impl CrudRepository for SqliteRoleRepository<'_> {
    type Entity = Role;

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Role>> {
        self.load(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Role>> {
        self.query(&format!("{ROLE_SELECT_SQL} ORDER BY id ASC;"), &[])
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Role>> {
        let order_by = order_by_clause(Role::NAME, request.sort.as_ref(), ROLE_SORT_COLUMNS)?;
        let content = self.query(
            &format!("{ROLE_SELECT_SQL} {order_by} LIMIT ?1 OFFSET ?2;"),
            &[
                i64::from(request.effective_size()),
                i64::try_from(request.offset()).unwrap_or(i64::MAX),
            ],
        )?;
        let total = count_rows(self.conn, "roles")?;
        Ok(Page::new(content, request, total))
    }

    fn save(&self, role: &Role) -> RepoResult<Role> {
        if role.authority.trim().is_empty() {
            return Err(ValidationError::single("authority", "Authority is required").into());
        }

        let id = match role.id {
            None => {
                self.conn.execute(
                    "INSERT INTO roles (authority) VALUES (?1);",
                    [role.authority.as_str()],
                )?;
                self.conn.last_insert_rowid()
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE roles SET authority = ?2 WHERE id = ?1;",
                    params![id, role.authority.as_str()],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: Role::NAME,
                        id,
                    });
                }
                id
            }
        };

        self.load(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("role {id} missing after save")))
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        delete_row(self.conn, "roles", Role::NAME, id)
    }

    fn get_reference(&self, id: EntityId) -> RepoResult<Reference<Role>> {
        existing_reference(self.conn, "roles", Role::NAME, id)
    }
}

impl RoleRepository for SqliteRoleRepository<'_> {
    fn find_all_by_ids(&self, ids: &[RoleId]) -> RepoResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query(
            &format!(
                "{ROLE_SELECT_SQL} WHERE id IN ({}) ORDER BY id ASC;",
                in_placeholders(ids.len())
            ),
            ids,
        )
    }
}

fn parse_role_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: Some(row.get("id")?),
        authority: row.get("authority")?,
    })
}
