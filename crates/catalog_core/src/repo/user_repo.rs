//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Saving a user rewrites its `user_role` links in the same transaction as
//!   the row itself.
//! - Updates keep the stored password hash when `User::password` is empty.

use crate::db::{SqliteTransactionManager, TransactionManager, TxMode};
use crate::model::page::{Page, PageRequest};
use crate::model::relation::{Reference, RelationSet};
use crate::model::user::{User, UserId};
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityId};
use crate::repo::{
    count_rows, delete_row, existing_reference, order_by_clause, CrudRepository, LinkTable,
    RepoError, RepoResult, SortColumn,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    password
FROM users";

const USER_SORT_COLUMNS: &[SortColumn] = &[
    ("id", "id"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("email", "email"),
];

const USER_ROLE: LinkTable = LinkTable {
    table: "user_role",
    owner_column: "user_id",
    target_column: "role_id",
    target_table: "roles",
    target_entity: "role",
};

/// User storage capability.
pub trait UserRepository: CrudRepository<Entity = User> {
    /// Looks a user up by exact email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_where(&self, clause: &str, value: &dyn rusqlite::ToSql) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE {clause};"),
                [value],
                parse_user_row,
            )
            .optional()?;
        user.map(|user| self.with_roles(user)).transpose()
    }

    fn with_roles(&self, mut user: User) -> RepoResult<User> {
        let id = user
            .id
            .ok_or_else(|| RepoError::InvalidData("user row without id".to_string()))?;
        user.roles = RelationSet::from_ids(USER_ROLE.load_ids(self.conn, id)?);
        Ok(user)
    }

    fn query(&self, sql: &str, values: &[i64]) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        drop(rows);
        users.into_iter().map(|user| self.with_roles(user)).collect()
    }

    fn write_row(&self, user: &User) -> RepoResult<UserId> {
        match user.id {
            None => {
                if user.password.is_empty() {
                    return Err(ValidationError::single("password", "Password is required").into());
                }
                self.conn.execute(
                    "INSERT INTO users (
                        first_name,
                        last_name,
                        email,
                        password
                    ) VALUES (?1, ?2, ?3, ?4);",
                    params![
                        user.first_name.as_str(),
                        user.last_name.as_str(),
                        user.email.as_str(),
                        user.password.as_str(),
                    ],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE users
                     SET
                        first_name = ?2,
                        last_name = ?3,
                        email = ?4,
                        password = COALESCE(NULLIF(?5, ''), password)
                     WHERE id = ?1;",
                    params![
                        id,
                        user.first_name.as_str(),
                        user.last_name.as_str(),
                        user.email.as_str(),
                        user.password.as_str(),
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: User::NAME,
                        id,
                    });
                }
                Ok(id)
            }
        }
    }
}

impl CrudRepository for SqliteUserRepository<'_> {
    type Entity = User;

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<User>> {
        self.load_where("id = ?1", &id)
    }

    fn find_all(&self) -> RepoResult<Vec<User>> {
        self.query(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"), &[])
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<User>> {
        let order_by = order_by_clause(User::NAME, request.sort.as_ref(), USER_SORT_COLUMNS)?;
        let content = self.query(
            &format!("{USER_SELECT_SQL} {order_by} LIMIT ?1 OFFSET ?2;"),
            &[
                i64::from(request.effective_size()),
                i64::try_from(request.offset()).unwrap_or(i64::MAX),
            ],
        )?;
        let total = count_rows(self.conn, "users")?;
        Ok(Page::new(content, request, total))
    }

    fn save(&self, user: &User) -> RepoResult<User> {
        user.validate()?;

        SqliteTransactionManager::new(self.conn).run(TxMode::ReadWrite, || {
            let id = self.write_row(user)?;
            USER_ROLE.replace(self.conn, id, &user.roles.ids())?;
            self.load_where("id = ?1", &id)?
                .ok_or_else(|| RepoError::InvalidData(format!("user {id} missing after save")))
        })
    }

    fn delete_by_id(&self, id: EntityId) -> RepoResult<()> {
        delete_row(self.conn, "users", User::NAME, id)
    }

    fn get_reference(&self, id: EntityId) -> RepoResult<Reference<User>> {
        existing_reference(self.conn, "users", User::NAME, id)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.load_where("email = ?1", &email)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Some(row.get("id")?),
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        password: row.get("password")?,
        roles: RelationSet::new(),
    })
}
